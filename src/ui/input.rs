/// Keyboard state tracker.
///
/// Movement needs "is this key held right now", but most terminals only send
/// Press and auto-repeat events. Two modes:
///   - Release events honored when the terminal supports keyboard
///     enhancement (kitty protocol); a key is held until released.
///   - Otherwise a key counts as held for `HOLD_TIMEOUT` after its last
///     Press/Repeat, long enough to bridge the OS auto-repeat gap.
///
/// Fresh presses (not-held → held) are tracked separately for one-shot
/// actions: jump edge, pause, confirm, mute.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went not-held → held during the latest drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw key events of the latest drain.
    raw_events: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unreliable without enhancement; the timeout handles it.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.honor_release {
            return;
        }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Held now, or tapped within this frame (a tap shorter than a frame
    /// still counts once).
    pub fn any_active(&self, codes: &[KeyCode]) -> bool {
        self.any_held(codes) || self.any_pressed(codes)
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn held_at(&self, code: KeyCode, now: Instant) -> bool {
        match self.last_active.get(&code) {
            Some(t) if self.honor_release => *t <= now,
            Some(t) => now.duration_since(*t) < HOLD_TIMEOUT,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.begin_frame();
        kb.record(press(KeyCode::Left), t0);
        assert!(kb.was_pressed(KeyCode::Left));

        kb.begin_frame();
        kb.record(press(KeyCode::Left), t0 + Duration::from_millis(30));
        assert!(!kb.was_pressed(KeyCode::Left));
        assert!(kb.held_at(KeyCode::Left, t0 + Duration::from_millis(40)));
    }

    #[test]
    fn held_key_times_out_without_release_support() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.record(press(KeyCode::Right), t0);
        kb.record(release(KeyCode::Right), t0);
        assert!(kb.held_at(KeyCode::Right, t0 + Duration::from_millis(100)));

        let later = t0 + HOLD_TIMEOUT + Duration::from_millis(1);
        kb.expire(later);
        assert!(!kb.held_at(KeyCode::Right, later));
    }

    #[test]
    fn release_is_honored_when_supported() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        let t0 = Instant::now();
        kb.record(press(KeyCode::Up), t0);
        let much_later = t0 + Duration::from_secs(5);
        kb.expire(much_later);
        assert!(kb.held_at(KeyCode::Up, much_later));

        kb.record(release(KeyCode::Up), much_later);
        assert!(!kb.held_at(KeyCode::Up, much_later));
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut kb = InputState::new();
        kb.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
        kb.begin_frame();
        kb.record(press(KeyCode::Char('c')), Instant::now());
        assert!(!kb.ctrl_c_pressed());
    }
}
