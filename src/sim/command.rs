/// Session commands: everything that changes the phase from outside the
/// simulation step (menus, pause, retry, mute).
///
///   Start       Menu                    → Playing (level 1, fresh score/lives)
///   Pause       Playing                 → Paused
///   Resume      Paused                  → Playing
///   Advance     LevelComplete           → Playing (next level) | AllClear
///   Retry       GameOver                → Playing (same level, lives reset)
///   Restart     GameOver | AllClear     → same as Start
///   Menu        any                     → Menu
///   ToggleMute  any                     → unchanged
///
/// A command the current phase does not accept is ignored.

use super::event::GameEvent;
use super::level::{load_level, LEVEL_COUNT};
use super::world::{Phase, WorldState, START_LIVES};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Advance,
    Retry,
    Restart,
    Menu,
    ToggleMute,
}

/// Apply a command. Returns the events it produced (only `AllCleared`,
/// when advancing past the last level).
pub fn apply(world: &mut WorldState, cmd: Command) -> Vec<GameEvent> {
    let mut events = vec![];
    let before = world.phase;

    match (cmd, world.phase) {
        (Command::Start, Phase::Menu)
        | (Command::Restart, Phase::GameOver | Phase::AllClear) => new_game(world),
        (Command::Pause, Phase::Playing) => world.phase = Phase::Paused,
        (Command::Resume, Phase::Paused) => world.phase = Phase::Playing,
        (Command::Advance, Phase::LevelComplete) => {
            let next = world.current_level + 1;
            if next > LEVEL_COUNT {
                world.phase = Phase::AllClear;
                events.push(GameEvent::AllCleared);
            } else if load_level(world, next) {
                world.phase = Phase::Playing;
            }
        }
        (Command::Retry, Phase::GameOver) => {
            if load_level(world, world.current_level) {
                world.lives = START_LIVES;
                world.phase = Phase::Playing;
            }
        }
        (Command::Menu, _) => world.phase = Phase::Menu,
        (Command::ToggleMute, _) => world.muted = !world.muted,
        _ => log::debug!("ignored {cmd:?} in {:?}", world.phase),
    }

    if world.phase != before {
        log::debug!("{before:?} -> {:?}", world.phase);
    }
    events
}

fn new_game(world: &mut WorldState) {
    world.score = 0;
    world.lives = START_LIVES;
    if load_level(world, 1) {
        world.phase = Phase::Playing;
    }
}
