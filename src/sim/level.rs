/// Built-in level table and per-session working copies.
///
/// `LEVELS` is immutable. Loading a level builds a fresh `LevelState` from its
/// `LevelDef`, so replaying a level always starts from the authored layout.
///
/// ## Authoring notes:
///   - Platforms are 20 px tall slabs, resolved in the order listed.
///   - A level with neither goal nor door is unwinnable; every level has one
///     of: `goal`, `goal_reveal`, or `door`.
///   - `goal_reveal` only applies while the level has no goal.

use crate::domain::entity::{Collectible, Enemy, Player, COLLECTIBLE_SIZE};
use crate::domain::rect::Rect;
use crate::sim::world::WorldState;

pub const PLATFORM_H: f32 = 20.0;
pub const GOAL_SIZE: f32 = 40.0;
pub const DOOR_SIZE: f32 = 50.0;

/// Enemy template: spawn point plus patrol bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatrolDef {
    pub x: f32,
    pub y: f32,
    pub start_x: f32,
    pub end_x: f32,
}

#[derive(Debug)]
pub struct LevelDef {
    pub name: &'static str,
    pub platforms: &'static [Rect],
    pub collectibles: &'static [Rect],
    pub enemies: &'static [PatrolDef],
    pub goal: Option<Rect>,
    /// Where the goal appears once every collectible is taken.
    pub goal_reveal: Option<Rect>,
    pub door: Option<Rect>,
    /// Countdown in seconds, if the level is timed.
    pub countdown: Option<f32>,
    pub spawn: (f32, f32),
}

// ══════════════════════════════════════════════════════════════
// Level table
// ══════════════════════════════════════════════════════════════

const fn slab(x: f32, y: f32, w: f32) -> Rect {
    Rect::new(x, y, w, PLATFORM_H)
}

const fn berry(x: f32, y: f32) -> Rect {
    Rect::new(x, y, COLLECTIBLE_SIZE, COLLECTIBLE_SIZE)
}

const fn flag(x: f32, y: f32) -> Rect {
    Rect::new(x, y, GOAL_SIZE, GOAL_SIZE)
}

const fn bee(x: f32, y: f32, end_x: f32) -> PatrolDef {
    PatrolDef { x, y, start_x: x, end_x }
}

const SPAWN: (f32, f32) = (100.0, 500.0);
const REVEAL_AT: Rect = flag(1100.0, 100.0);

pub const LEVEL_COUNT: u32 = 5;

pub static LEVELS: [LevelDef; LEVEL_COUNT as usize] = [
    LevelDef {
        name: "First Steps",
        platforms: &[
            slab(0.0, 650.0, 1280.0),
            slab(300.0, 550.0, 200.0),
            slab(600.0, 450.0, 200.0),
            slab(900.0, 350.0, 200.0),
        ],
        collectibles: &[],
        enemies: &[],
        goal: Some(flag(1100.0, 300.0)),
        goal_reveal: None,
        door: None,
        countdown: None,
        spawn: SPAWN,
    },
    LevelDef {
        name: "Berry Stairs",
        platforms: &[
            slab(0.0, 650.0, 1280.0),
            slab(200.0, 550.0, 150.0),
            slab(400.0, 450.0, 150.0),
            slab(600.0, 350.0, 150.0),
            slab(800.0, 250.0, 150.0),
            slab(1000.0, 150.0, 150.0),
        ],
        collectibles: &[
            berry(250.0, 520.0),
            berry(450.0, 420.0),
            berry(650.0, 320.0),
            berry(850.0, 220.0),
            berry(1050.0, 120.0),
        ],
        enemies: &[],
        goal: None,
        goal_reveal: Some(REVEAL_AT),
        door: None,
        countdown: None,
        spawn: SPAWN,
    },
    LevelDef {
        name: "Busy Bees",
        platforms: &[
            slab(0.0, 650.0, 1280.0),
            slab(200.0, 550.0, 200.0),
            slab(500.0, 450.0, 200.0),
            slab(800.0, 350.0, 200.0),
        ],
        collectibles: &[
            berry(300.0, 520.0),
            berry(600.0, 420.0),
            berry(900.0, 320.0),
        ],
        enemies: &[bee(250.0, 520.0, 350.0)],
        goal: Some(flag(1000.0, 300.0)),
        goal_reveal: None,
        door: None,
        countdown: None,
        spawn: SPAWN,
    },
    LevelDef {
        name: "Beat the Clock",
        platforms: &[
            slab(0.0, 650.0, 1280.0),
            slab(150.0, 550.0, 150.0),
            slab(350.0, 450.0, 150.0),
            slab(550.0, 350.0, 150.0),
            slab(750.0, 250.0, 150.0),
            slab(950.0, 150.0, 150.0),
        ],
        collectibles: &[
            berry(200.0, 520.0),
            berry(400.0, 420.0),
            berry(600.0, 320.0),
            berry(800.0, 220.0),
            berry(1000.0, 120.0),
        ],
        enemies: &[bee(200.0, 520.0, 300.0), bee(600.0, 320.0, 700.0)],
        goal: Some(flag(1100.0, 100.0)),
        goal_reveal: None,
        door: None,
        countdown: Some(20.0),
        spawn: SPAWN,
    },
    LevelDef {
        name: "The Big Door",
        platforms: &[
            slab(0.0, 650.0, 1280.0),
            slab(100.0, 550.0, 100.0),
            slab(250.0, 450.0, 100.0),
            slab(400.0, 350.0, 100.0),
            slab(550.0, 250.0, 100.0),
            slab(700.0, 150.0, 100.0),
            slab(850.0, 250.0, 100.0),
            slab(1000.0, 350.0, 100.0),
        ],
        collectibles: &[
            berry(150.0, 520.0),
            berry(300.0, 420.0),
            berry(450.0, 320.0),
            berry(600.0, 220.0),
            berry(750.0, 120.0),
            berry(900.0, 220.0),
            berry(1050.0, 320.0),
        ],
        enemies: &[
            bee(150.0, 520.0, 200.0),
            bee(450.0, 320.0, 500.0),
            bee(750.0, 120.0, 800.0),
        ],
        goal: None,
        goal_reveal: Some(REVEAL_AT),
        door: Some(Rect::new(1100.0, 300.0, DOOR_SIZE, DOOR_SIZE)),
        countdown: None,
        spawn: SPAWN,
    },
];

/// Look up a level by its 1-based index.
pub fn level_def(index: u32) -> Option<&'static LevelDef> {
    let i = usize::try_from(index).ok()?.checked_sub(1)?;
    LEVELS.get(i)
}

// ══════════════════════════════════════════════════════════════
// Working copy
// ══════════════════════════════════════════════════════════════

/// Mutable state of the active level. Geometry stays borrowed from the
/// static table; everything that changes during play is owned here.
#[derive(Clone, Debug)]
pub struct LevelState {
    pub def: &'static LevelDef,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<Enemy>,
    pub goal: Option<Rect>,
}

impl LevelState {
    pub fn from_def(def: &'static LevelDef, enemy_speed: f32) -> Self {
        LevelState {
            def,
            collectibles: def.collectibles.iter().copied().map(Collectible::new).collect(),
            enemies: def
                .enemies
                .iter()
                .map(|p| Enemy::new(p.x, p.y, enemy_speed, p.start_x, p.end_x))
                .collect(),
            goal: def.goal,
        }
    }

    #[inline]
    pub fn platforms(&self) -> &'static [Rect] {
        self.def.platforms
    }

    /// True when nothing is left to pick up. Vacuously true for levels
    /// without collectibles.
    pub fn all_collected(&self) -> bool {
        self.collectibles.iter().all(|c| c.collected)
    }

    pub fn remaining(&self) -> usize {
        self.collectibles.iter().filter(|c| !c.collected).count()
    }
}

impl Default for LevelState {
    fn default() -> Self {
        LevelState::from_def(&LEVELS[0], 0.0)
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a level into the world. Preserves score and lives.
/// Returns false (world untouched) if the index is out of range.
pub fn load_level(world: &mut WorldState, index: u32) -> bool {
    let Some(def) = level_def(index) else {
        log::warn!("no level {index}");
        return false;
    };

    world.current_level = index;
    world.level = LevelState::from_def(def, world.physics.enemy_speed);
    world.player = Player::new(def.spawn.0, def.spawn.1);
    world.particles.clear();
    world.time_left = def.countdown;
    world.tick = 0;

    log::info!("level {index} \"{}\" loaded", def.name);
    true
}
