/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub tick_hz: u32,
    pub start_muted: bool,
    pub gamepad: GamepadConfig,
    /// Where best times and the log file live. None = platform default.
    pub save_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub player_speed: f32, // px/s
    pub jump_force: f32,   // px/s, initial upward velocity
    pub gravity: f32,      // px/s²
    pub friction: f32,     // per-tick multiplier on vx when no direction is held
    pub enemy_speed: f32,  // px/s
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            player_speed: default_player_speed(),
            jump_force: default_jump_force(),
            gravity: default_gravity(),
            friction: default_friction(),
            enemy_speed: default_enemy_speed(),
        }
    }
}

impl GameConfig {
    /// Fixed simulation timestep in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_jump_force")]
    jump_force: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_hz")]
    tick_hz: u32,
}

#[derive(Deserialize, Debug, Default)]
struct TomlAudio {
    #[serde(default)]
    muted: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    save_dir: String,
}

// ── Defaults ──

/// Friction bounds: above zero so a released key never stops the player
/// dead, below one so sliding always ends.
const MIN_FRICTION: f32 = 0.01;
const MAX_FRICTION: f32 = 0.999;


fn default_player_speed() -> f32 { 300.0 }
fn default_jump_force() -> f32 { 400.0 }
fn default_gravity() -> f32 { 800.0 }
fn default_friction() -> f32 { 0.8 }
fn default_enemy_speed() -> f32 { 100.0 }
fn default_tick_hz() -> u32 { 60 }

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            player_speed: default_player_speed(),
            jump_force: default_jump_force(),
            gravity: default_gravity(),
            friction: default_friction(),
            enemy_speed: default_enemy_speed(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_hz: default_tick_hz() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_from(&candidate_dirs())
    }

    /// Parse config text directly. Parse errors fall back to defaults.
    pub fn parse(text: &str) -> Self {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("config.toml parse error: {e}; using default settings");
                TomlConfig::default()
            }
        };
        Self::from_toml(toml_cfg)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let p = toml_cfg.physics;
        let save_dir = match toml_cfg.general.save_dir.trim() {
            "" => None,
            dir => Some(PathBuf::from(dir)),
        };

        GameConfig {
            physics: PhysicsConfig {
                player_speed: p.player_speed,
                jump_force: p.jump_force,
                gravity: p.gravity,
                friction: p.friction.clamp(MIN_FRICTION, MAX_FRICTION),
                enemy_speed: p.enemy_speed,
            },
            tick_hz: toml_cfg.timing.tick_hz.clamp(10, 240),
            start_muted: toml_cfg.audio.muted,
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            save_dir,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First config.toml found in `search_dirs`, or defaults.
fn load_from(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("loading {}", path.display());
                return GameConfig::parse(&text);
            }
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    GameConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("");
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.tick_hz, 60);
        assert!(!cfg.start_muted);
        assert!(cfg.save_dir.is_none());
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[physics]\ngravity = 1000.0\n\n[audio]\nmuted = true\n",
        );
        assert_eq!(cfg.physics.gravity, 1000.0);
        assert_eq!(cfg.physics.player_speed, 300.0);
        assert!(cfg.start_muted);
    }

    #[test]
    fn malformed_file_falls_back() {
        let cfg = GameConfig::parse("[physics\ngravity = ");
        assert_eq!(cfg.physics, PhysicsConfig::default());
    }

    #[test]
    fn tick_rate_is_clamped() {
        let cfg = GameConfig::parse("[timing]\ntick_hz = 0\n");
        assert_eq!(cfg.tick_hz, 10);
        let cfg = GameConfig::parse("[timing]\ntick_hz = 60\n");
        assert!((cfg.dt() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn friction_stays_strictly_between_zero_and_one() {
        let cfg = GameConfig::parse("[physics]\nfriction = 0.0\n");
        assert!(cfg.physics.friction > 0.0);
        assert_eq!(cfg.physics.friction, MIN_FRICTION);
        let cfg = GameConfig::parse("[physics]\nfriction = 1.5\n");
        assert!(cfg.physics.friction < 1.0);
    }

    #[test]
    fn config_file_is_read_from_first_dir_that_has_one() {
        let root = std::env::temp_dir().join(format!("strawberry-cfg-{}", std::process::id()));
        let (empty, full) = (root.join("empty"), root.join("full"));
        std::fs::create_dir_all(&empty).expect("mkdir");
        std::fs::create_dir_all(&full).expect("mkdir");
        std::fs::write(full.join("config.toml"), "[timing]\ntick_hz = 30\n").expect("write");

        let cfg = load_from(&[empty.clone(), full.clone()]);
        assert_eq!(cfg.tick_hz, 30);
        assert_eq!(load_from(&[empty]).tick_hz, 60);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn save_dir_override() {
        let cfg = GameConfig::parse("[general]\nsave_dir = \"/tmp/berries\"\n");
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/berries")));
    }
}
