/// Best-time persistence.
///
/// One record per countdown level: the fastest completion in seconds.
/// Stored as a JSON object keyed by level index:
///
///   { "4": 12.35 }
///
/// The session only ever talks to a `BestTimeStore`; the file-backed store
/// is what the game uses, the in-memory one backs tests and the fallback
/// when no save directory can be found.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sim::event::GameEvent;
use crate::sim::world::WorldState;

const BEST_TIMES_FILE: &str = "best_times.json";

// ══════════════════════════════════════════════════════════════
// Record
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BestTimes(BTreeMap<u32, f64>);

impl BestTimes {
    pub fn get(&self, level: u32) -> Option<f64> {
        self.0.get(&level).copied()
    }

    /// Keep `seconds` if it beats the stored time (or none exists).
    /// Returns true when the record changed.
    pub fn record(&mut self, level: u32, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        match self.0.get(&level) {
            Some(&best) if best <= seconds => false,
            _ => {
                self.0.insert(level, seconds);
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════
// Stores
// ══════════════════════════════════════════════════════════════

pub trait BestTimeStore {
    /// Read the stored record. Anything unreadable yields an empty record.
    fn load(&self) -> BestTimes;
    fn save(&mut self, times: &BestTimes) -> io::Result<()>;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        FileStore { path: dir.join(BEST_TIMES_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BestTimeStore for FileStore {
    fn load(&self) -> BestTimes {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BestTimes::default(),
            Err(e) => {
                log::warn!("could not read {}: {e}", self.path().display());
                return BestTimes::default();
            }
        };
        match serde_json::from_str::<BestTimes>(&text) {
            Ok(times) => {
                log::info!("loaded best times from {}", self.path().display());
                times
            }
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", self.path().display());
                BestTimes::default()
            }
        }
    }

    fn save(&mut self, times: &BestTimes) -> io::Result<()> {
        let json = serde_json::to_string_pretty(times)?;
        std::fs::write(self.path(), json)?;
        log::info!("wrote {}", self.path().display());
        Ok(())
    }
}

/// Keeps the record for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryStore {
    saved: BestTimes,
    pub writes: usize,
}

impl BestTimeStore for MemoryStore {
    fn load(&self) -> BestTimes {
        self.saved.clone()
    }

    fn save(&mut self, times: &BestTimes) -> io::Result<()> {
        self.saved = times.clone();
        self.writes += 1;
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Directory for best times and the log file.
/// An explicit override wins; otherwise exe dir (if writable), then
/// ~/.local/share/strawberry-quest, then CWD.
pub fn save_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        if std::fs::create_dir_all(dir).is_ok() {
            return dir.to_path_buf();
        }
    }

    // 1. Exe directory (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_strawberry");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/strawberry-quest");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// File store in `dir`, or a memory-only store when `dir` cannot be created.
pub fn open_store(dir: &Path) -> Box<dyn BestTimeStore> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Box::new(FileStore::new(dir)),
        Err(e) => {
            log::warn!("cannot use {} for best times ({e}); keeping them in memory", dir.display());
            Box::new(MemoryStore::default())
        }
    }
}

/// Write the record out if this batch of events set a new best.
/// A failed write is logged; the in-memory record stays authoritative.
pub fn persist_new_bests(
    store: &mut dyn BestTimeStore,
    world: &WorldState,
    events: &[GameEvent],
) -> bool {
    if !events.iter().any(|e| matches!(e, GameEvent::NewBestTime { .. })) {
        return false;
    }
    match store.save(&world.best_times) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("could not save best times: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::entity::{FrameInput, Player};
    use crate::sim::level::load_level;
    use crate::sim::step::step;
    use crate::sim::world::Phase;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strawberry-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    /// Finish level 4 with `left` seconds on the clock.
    fn finish_level_four(world: &mut WorldState, left: f32) -> Vec<GameEvent> {
        assert!(load_level(world, 4));
        world.phase = Phase::Playing;
        world.time_left = Some(left);
        world.player = Player::new(1105.0, 105.0);
        step(world, FrameInput::default(), 1.0 / 60.0)
    }

    #[test]
    fn record_keeps_the_fastest() {
        let mut t = BestTimes::default();
        assert!(t.record(4, 12.0));
        assert!(!t.record(4, 15.0));
        assert!(!t.record(4, 12.0));
        assert!(t.record(4, 9.5));
        assert_eq!(t.get(4), Some(9.5));
        assert_eq!(t.get(1), None);
    }

    #[test]
    fn record_rejects_nonsense() {
        let mut t = BestTimes::default();
        assert!(!t.record(4, f64::NAN));
        assert!(!t.record(4, -1.0));
        assert!(t.is_empty());
    }

    #[test]
    fn json_is_keyed_by_level() {
        let mut t = BestTimes::default();
        t.record(4, 8.0);
        let json = serde_json::to_string(&t).expect("serialize");
        assert_eq!(json, r#"{"4":8.0}"#);
        let back: BestTimes = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, t);
    }

    #[test]
    fn file_store_missing_or_garbage_is_empty() {
        let dir = scratch_dir("garbage");
        let store = FileStore::new(&dir);
        assert!(store.load().is_empty());
        std::fs::write(store.path(), "not json").expect("write");
        assert!(store.load().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_survives_a_restart() {
        let dir = scratch_dir("restart");
        let mut world = WorldState::new(PhysicsConfig::default());
        let mut store = FileStore::new(&dir);

        let events = finish_level_four(&mut world, 12.0);
        assert!(persist_new_bests(&mut store, &world, &events));

        let reopened = FileStore::new(&dir);
        assert_eq!(reopened.load().get(4), Some(8.0));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn faster_completion_is_persisted() {
        let mut store = MemoryStore::default();
        let mut world = WorldState::new(PhysicsConfig::default());

        let events = finish_level_four(&mut world, 10.0);
        assert!(persist_new_bests(&mut store, &world, &events));
        let events = finish_level_four(&mut world, 14.0);
        assert!(persist_new_bests(&mut store, &world, &events));

        assert_eq!(store.load().get(4), Some(6.0));
        assert_eq!(store.writes, 2);
    }

    #[test]
    fn slower_completion_leaves_store_alone() {
        let mut store = MemoryStore::default();
        let mut world = WorldState::new(PhysicsConfig::default());

        let events = finish_level_four(&mut world, 14.0);
        persist_new_bests(&mut store, &world, &events);
        let events = finish_level_four(&mut world, 10.0);
        assert!(!persist_new_bests(&mut store, &world, &events));

        assert_eq!(store.load().get(4), Some(6.0));
        assert_eq!(store.writes, 1);
    }

    #[test]
    fn unwritable_store_is_not_fatal() {
        let dir = scratch_dir("readonly").join("missing-subdir");
        let mut store = FileStore::new(&dir);
        let mut world = WorldState::new(PhysicsConfig::default());
        let events = finish_level_four(&mut world, 12.0);
        assert!(!persist_new_bests(&mut store, &world, &events));
        assert_eq!(world.best_times.get(4), Some(8.0));
    }
}
