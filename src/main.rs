/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use env_logger::{Env, Target};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::command::{self, Command};
use sim::event::{Cue, GameEvent};
use sim::save::{self, BestTimeStore};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "strawberry-quest.log";

/// Message durations, in ticks.
const TOAST_SHORT: u32 = 60;
const TOAST_LONG: u32 = 120;

fn main() {
    init_logging(&save::save_dir(None));

    let config = GameConfig::load();
    let dir = save::save_dir(config.save_dir.as_deref());
    let mut store = save::open_store(&dir);

    let mut world = WorldState::new(config.physics.clone());
    world.muted = config.start_muted;
    world.best_times = store.load();
    if world.best_times.is_empty() {
        log::info!("no best times recorded yet");
    }
    log::info!("starting: tick {} Hz, save dir {}", config.tick_hz, dir.display());

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), store.as_mut(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Strawberry Quest!");
    println!("Final Score: {}", world.score);
}

/// The terminal is in raw mode while playing, so log lines go to a file.
fn init_logging(dir: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)) {
        Ok(f) => f,
        Err(_) => return,
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    store: &mut dyn BestTimeStore,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release_supported();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let dt = config.dt();
    let tick_rate = Duration::from_secs_f32(dt);
    let mut last_tick = Instant::now();
    let mut pad_connected = gp.connected;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if gp.connected != pad_connected {
            pad_connected = gp.connected;
            let msg = if pad_connected { "Gamepad connected" } else { "Gamepad disconnected" };
            world.set_message(msg, TOAST_SHORT);
        }
        let Some(events) = handle_meta(world, &kb, &gp) else {
            break;
        };
        react(world, sound, store, &events);

        if last_tick.elapsed() >= tick_rate {
            if world.phase == Phase::Playing {
                let input = frame_input(&kb, &gp);
                let events = step::step(world, input, dt);
                react(world, sound, store, &events);
            }

            world.anim_tick = world.anim_tick.wrapping_add(1);
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Sound, persistence and toasts for events from a step or a command.
fn react(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    store: &mut dyn BestTimeStore,
    events: &[GameEvent],
) {
    if events.is_empty() {
        return;
    }
    if !world.muted {
        process_sound_events(sound, events);
    }
    if save::persist_new_bests(store, world, events) {
        log::info!("best times saved");
    }
    announce(world, events);
}

fn cues(events: &[GameEvent]) -> Vec<Cue> {
    events.iter().filter_map(GameEvent::cue).collect()
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for cue in cues(events) {
        sfx.play(cue);
    }
}

/// HUD toasts for the events a child should notice.
fn announce(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PlayerHit { lives_left } if *lives_left > 0 => {
                world.set_message(&format!("Ouch! {lives_left} lives left"), TOAST_SHORT)
            }
            GameEvent::GoalRevealed { .. } => world.set_message("The flag appeared!", TOAST_LONG),
            GameEvent::NewBestTime { seconds, .. } => {
                world.set_message(&format!("New best time! {seconds:.1}s"), TOAST_LONG)
            }
            GameEvent::TimeUp => world.set_message("Time's up!", TOAST_LONG),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_RETRY: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];

fn frame_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    FrameInput {
        left: kb.any_active(KEYS_LEFT) || gp.left_held(),
        right: kb.any_active(KEYS_RIGHT) || gp.right_held(),
        up: kb.any_active(KEYS_UP) || gp.jump_held(),
    }
}

/// Edge-triggered keys and buttons seen this frame.
#[derive(Clone, Copy, Default, Debug)]
struct MetaKeys {
    confirm: bool,
    pause: bool,
    esc: bool,
    quit: bool,
    retry: bool,
    mute: bool,
    pad_confirm: bool,
    pad_cancel: bool,
}

impl MetaKeys {
    fn read(kb: &InputState, gp: &GamepadState) -> Self {
        MetaKeys {
            confirm: kb.any_pressed(KEYS_CONFIRM),
            pause: kb.any_pressed(KEYS_PAUSE),
            esc: kb.was_pressed(KeyCode::Esc),
            quit: kb.any_pressed(KEYS_QUIT),
            retry: kb.any_pressed(KEYS_RETRY),
            mute: kb.any_pressed(KEYS_MUTE),
            pad_confirm: gp.confirm_pressed(),
            pad_cancel: gp.cancel_pressed(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Action {
    Quit,
    Run(Command),
}

/// Map this frame's meta keys to at most one action for the current phase.
fn meta_action(phase: Phase, k: &MetaKeys) -> Option<Action> {
    if k.mute {
        return Some(Action::Run(Command::ToggleMute));
    }
    let confirm = k.confirm || k.pad_confirm;
    let back = k.quit || k.esc || k.pad_cancel;

    let cmd = match phase {
        Phase::Menu => {
            if confirm {
                Command::Start
            } else if k.quit || k.esc {
                return Some(Action::Quit);
            } else {
                return None;
            }
        }
        Phase::Playing => {
            if k.pause || k.esc || k.pad_confirm {
                Command::Pause
            } else if k.quit || k.pad_cancel {
                Command::Menu
            } else {
                return None;
            }
        }
        Phase::Paused => {
            if k.pause || k.esc || confirm {
                Command::Resume
            } else if k.quit || k.pad_cancel {
                Command::Menu
            } else {
                return None;
            }
        }
        Phase::LevelComplete => {
            if confirm {
                Command::Advance
            } else if back {
                Command::Menu
            } else {
                return None;
            }
        }
        Phase::GameOver => {
            if k.retry {
                Command::Retry
            } else if confirm {
                Command::Restart
            } else if back {
                Command::Menu
            } else {
                return None;
            }
        }
        Phase::AllClear => {
            if confirm {
                Command::Restart
            } else if back {
                Command::Menu
            } else {
                return None;
            }
        }
    };
    Some(Action::Run(cmd))
}

/// Events produced by this frame's meta keys; None when the player quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> Option<Vec<GameEvent>> {
    let keys = MetaKeys::read(kb, gp);
    match meta_action(world.phase, &keys) {
        Some(Action::Quit) => None,
        Some(Action::Run(cmd)) => Some(run_command(world, cmd)),
        None => Some(vec![]),
    }
}

fn run_command(world: &mut WorldState, cmd: Command) -> Vec<GameEvent> {
    let events = command::apply(world, cmd);
    if cmd == Command::ToggleMute {
        let msg = if world.muted { "Sound off" } else { "Sound on" };
        world.set_message(msg, TOAST_SHORT);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(f: impl FnOnce(&mut MetaKeys)) -> MetaKeys {
        let mut k = MetaKeys::default();
        f(&mut k);
        k
    }

    #[test]
    fn nothing_pressed_does_nothing() {
        let k = MetaKeys::default();
        for phase in [Phase::Menu, Phase::Playing, Phase::Paused, Phase::LevelComplete, Phase::GameOver, Phase::AllClear] {
            assert_eq!(meta_action(phase, &k), None, "{phase:?}");
        }
    }

    #[test]
    fn menu_starts_or_quits() {
        assert_eq!(meta_action(Phase::Menu, &keys(|k| k.confirm = true)), Some(Action::Run(Command::Start)));
        assert_eq!(meta_action(Phase::Menu, &keys(|k| k.pad_confirm = true)), Some(Action::Run(Command::Start)));
        assert_eq!(meta_action(Phase::Menu, &keys(|k| k.esc = true)), Some(Action::Quit));
        assert_eq!(meta_action(Phase::Menu, &keys(|k| k.pad_cancel = true)), None);
    }

    #[test]
    fn escape_pauses_and_resumes() {
        let esc = keys(|k| k.esc = true);
        assert_eq!(meta_action(Phase::Playing, &esc), Some(Action::Run(Command::Pause)));
        assert_eq!(meta_action(Phase::Paused, &esc), Some(Action::Run(Command::Resume)));
        assert_eq!(meta_action(Phase::Paused, &keys(|k| k.confirm = true)), Some(Action::Run(Command::Resume)));
        assert_eq!(meta_action(Phase::Playing, &keys(|k| k.quit = true)), Some(Action::Run(Command::Menu)));
    }

    #[test]
    fn space_while_playing_is_not_a_meta_key() {
        // Space doubles as jump; only the pad's confirm pauses.
        assert_eq!(meta_action(Phase::Playing, &keys(|k| k.confirm = true)), None);
        assert_eq!(meta_action(Phase::Playing, &keys(|k| k.pad_confirm = true)), Some(Action::Run(Command::Pause)));
    }

    #[test]
    fn game_over_choices() {
        assert_eq!(meta_action(Phase::GameOver, &keys(|k| k.retry = true)), Some(Action::Run(Command::Retry)));
        assert_eq!(meta_action(Phase::GameOver, &keys(|k| k.confirm = true)), Some(Action::Run(Command::Restart)));
        assert_eq!(meta_action(Phase::GameOver, &keys(|k| k.quit = true)), Some(Action::Run(Command::Menu)));
    }

    #[test]
    fn level_complete_and_all_clear() {
        let enter = keys(|k| k.confirm = true);
        assert_eq!(meta_action(Phase::LevelComplete, &enter), Some(Action::Run(Command::Advance)));
        assert_eq!(meta_action(Phase::AllClear, &enter), Some(Action::Run(Command::Restart)));
        assert_eq!(meta_action(Phase::AllClear, &keys(|k| k.pad_cancel = true)), Some(Action::Run(Command::Menu)));
    }

    #[test]
    fn mute_wins_in_every_phase() {
        let k = keys(|k| {
            k.mute = true;
            k.confirm = true;
        });
        assert_eq!(meta_action(Phase::Menu, &k), Some(Action::Run(Command::ToggleMute)));
        assert_eq!(meta_action(Phase::GameOver, &k), Some(Action::Run(Command::ToggleMute)));
    }

    #[test]
    fn finishing_the_last_level_plays_the_win_cue() {
        let mut w = WorldState::new(config::PhysicsConfig::default());
        assert!(sim::level::load_level(&mut w, sim::level::LEVEL_COUNT));
        w.phase = Phase::LevelComplete;

        let Some(Action::Run(cmd)) = meta_action(w.phase, &keys(|k| k.confirm = true)) else {
            panic!("confirm should advance");
        };
        let events = run_command(&mut w, cmd);
        assert_eq!(w.phase, Phase::AllClear);
        assert_eq!(cues(&events), vec![Cue::Win]);
    }

    #[test]
    fn mute_command_reports_state() {
        let mut w = WorldState::new(config::PhysicsConfig::default());
        assert!(run_command(&mut w, Command::ToggleMute).is_empty());
        assert!(w.muted);
        assert_eq!(w.message, "Sound off");
    }

    #[test]
    fn announce_sets_toasts() {
        let mut w = WorldState::new(config::PhysicsConfig::default());
        announce(&mut w, &[GameEvent::PlayerHit { lives_left: 2 }]);
        assert_eq!(w.message, "Ouch! 2 lives left");
        announce(&mut w, &[GameEvent::NewBestTime { level: 4, seconds: 12.34 }]);
        assert_eq!(w.message, "New best time! 12.3s");
        w.message.clear();
        announce(&mut w, &[GameEvent::PlayerHit { lives_left: 0 }, GameEvent::GameOver]);
        assert!(w.message.is_empty());
    }
}
