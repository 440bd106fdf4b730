/// WorldState: the complete snapshot of a running session.
///
/// One instance, owned by the loop driver. The simulation (`step`) and the
/// command handler (`command::apply`) are the only writers; the renderer
/// only reads.
///
/// ## Level data
///
///   - `level.def`  the authored level. Never mutated.
///   - `level`      the working copy (collectible flags, enemy positions,
///                    revealed goal). Rebuilt from `def` on every load.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::PhysicsConfig;
use crate::domain::entity::{Collectible, Particle, Player};
use crate::sim::level::LevelState;
use crate::sim::save::BestTimes;

pub const START_LIVES: u32 = 3;
pub const POINTS_PER_COLLECTIBLE: u32 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    Paused,
    LevelComplete,
    GameOver,
    AllClear,
}

pub struct WorldState {
    // ── Entities ──
    pub player: Player,
    pub level: LevelState,
    pub particles: Vec<Particle>,

    // ── Tuning ──
    pub physics: PhysicsConfig,

    // ── Meta ──
    pub phase: Phase,
    /// 1-based index of the active level.
    pub current_level: u32,
    pub score: u32,
    pub lives: u32,
    /// Seconds left on a countdown level; None when the level is untimed.
    pub time_left: Option<f32>,
    pub muted: bool,
    pub best_times: BestTimes,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,

    /// Particle spread. Seeded from the OS in play, fixed in tests.
    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    pub fn new(physics: PhysicsConfig) -> Self {
        Self::with_rng(physics, StdRng::from_os_rng())
    }

    pub fn with_rng(physics: PhysicsConfig, rng: StdRng) -> Self {
        WorldState {
            player: Player::new(0.0, 0.0),
            level: LevelState::default(),
            particles: vec![],
            physics,
            phase: Phase::Menu,
            current_level: 1,
            score: 0,
            lives: START_LIVES,
            time_left: None,
            muted: false,
            best_times: BestTimes::default(),
            tick: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            rng,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count the message timer down once per frame.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    pub fn visible_collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.level.collectibles.iter().filter(|c| !c.collected)
    }

    /// HUD time readout: whole seconds rounded up, or `--` when untimed.
    pub fn time_display(&self) -> String {
        match self.time_left {
            Some(t) => format!("{}", t.max(0.0).ceil() as u32),
            None => "--".to_string(),
        }
    }

    pub fn level_name(&self) -> &'static str {
        self.level.def.name
    }
}
