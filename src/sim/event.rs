/// Events emitted during a simulation step or command.
/// The presentation layer consumes these for sound, toasts and persistence.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Collected { x: f32, y: f32 },
    PlayerHit { lives_left: u32 },
    GoalRevealed { x: f32, y: f32 },
    LevelCompleted { level: u32 },
    NewBestTime { level: u32, seconds: f64 },
    AllCleared,
    GameOver,
    TimeUp,
}

/// Audio cue names, one per distinct sound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Jump,
    Collect,
    Hit,
    Win,
}

impl GameEvent {
    /// The sound this event should trigger, if any.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            GameEvent::Jumped => Some(Cue::Jump),
            GameEvent::Collected { .. } => Some(Cue::Collect),
            GameEvent::PlayerHit { .. } => Some(Cue::Hit),
            GameEvent::LevelCompleted { .. } | GameEvent::AllCleared => Some(Cue::Win),
            GameEvent::GoalRevealed { .. }
            | GameEvent::NewBestTime { .. }
            | GameEvent::GameOver
            | GameEvent::TimeUp => None,
        }
    }
}
