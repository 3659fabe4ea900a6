//! Single-line text input with hold-to-repeat backspace.

use crate::data::input::InputEvent;
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::{Duration, Instant};

/// Hold time before backspace starts repeating
pub const REPEAT_DELAY: Duration = Duration::from_millis(500);
/// Delay between repeated deletions once repeating
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct TextField {
    text: String,
    active: bool,
    numeric_only: bool,
    /// Time of the last deletion while backspace is held
    backspace_since: Option<Instant>,
    delete_wait: Duration,
}

impl TextField {
    pub fn new(numeric_only: bool) -> Self {
        Self {
            text: String::new(),
            active: false,
            numeric_only,
            backspace_since: None,
            delete_wait: REPEAT_DELAY,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start editing with `initial` already typed
    pub fn activate(&mut self, initial: impl Into<String>) {
        self.text = initial.into();
        self.active = true;
        self.release_backspace();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.release_backspace();
    }

    /// Stop editing and hand back what was typed
    pub fn take(&mut self) -> String {
        self.deactivate();
        std::mem::take(&mut self.text)
    }

    /// Apply one key event. Returns true when the text changed.
    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        match *event {
            InputEvent::KeyDown {
                code: KeyCode::Backspace,
                ..
            } => {
                self.backspace_since = Some(now);
                self.delete_wait = REPEAT_DELAY;
                self.text.pop().is_some()
            }
            InputEvent::KeyUp {
                code: KeyCode::Backspace,
                ..
            } => {
                self.release_backspace();
                false
            }
            InputEvent::KeyDown {
                code: KeyCode::Char(c),
                modifiers,
            } => {
                if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                    return false;
                }
                if self.numeric_only && !c.is_ascii_digit() {
                    return false;
                }
                self.text.push(c);
                true
            }
            _ => false,
        }
    }

    /// Repeat deletion while backspace stays held. Returns true when a
    /// character was removed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(since) = self.backspace_since else {
            return false;
        };
        if now.saturating_duration_since(since) < self.delete_wait {
            return false;
        }
        self.delete_wait = REPEAT_INTERVAL;
        self.backspace_since = Some(now);
        self.text.pop().is_some()
    }

    /// Deadline of the next repeat while backspace is held
    pub fn next_repeat(&self) -> Option<Instant> {
        self.backspace_since.map(|since| since + self.delete_wait)
    }

    fn release_backspace(&mut self) {
        self.backspace_since = None;
        self.delete_wait = REPEAT_DELAY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_inactive_field_ignores_input() {
        let mut field = TextField::new(false);
        assert!(!field.handle_event(&InputEvent::key_down(KeyCode::Char('a')), Instant::now()));
        assert_eq!(field.text(), "");
    }

    #[test]
    fn test_typing_and_control_keys() {
        let mut field = TextField::new(false);
        let now = Instant::now();
        field.activate("");
        for c in ['a', '1'] {
            field.handle_event(&InputEvent::key_down(KeyCode::Char(c)), now);
        }
        field.handle_event(&InputEvent::key_down(KeyCode::Enter), now);
        field.handle_event(&InputEvent::key_down(KeyCode::Esc), now);
        assert_eq!(field.text(), "a1");
        field.handle_event(&InputEvent::key_down(KeyCode::Backspace), now);
        assert_eq!(field.text(), "a");
    }

    #[test]
    fn test_numeric_only_filters_letters() {
        let mut field = TextField::new(true);
        let now = Instant::now();
        field.activate("");
        for c in ['4', 'x', '2', ' '] {
            field.handle_event(&InputEvent::key_down(KeyCode::Char(c)), now);
        }
        assert_eq!(field.text(), "42");
    }

    #[test]
    fn test_backspace_repeat_timing() {
        let mut field = TextField::new(false);
        let t0 = Instant::now();
        field.activate("abcdefgh");
        field.handle_event(&InputEvent::key_down(KeyCode::Backspace), t0);
        assert_eq!(field.text(), "abcdefg");

        assert!(!field.tick(t0 + ms(400)));
        assert!(field.tick(t0 + ms(501)));
        assert_eq!(field.text(), "abcdef");
        assert!(!field.tick(t0 + ms(540)));
        assert!(field.tick(t0 + ms(552)));
        assert_eq!(field.text(), "abcde");

        field.handle_event(&InputEvent::key_up(KeyCode::Backspace), t0 + ms(560));
        assert!(!field.tick(t0 + ms(2000)));
        assert_eq!(field.text(), "abcde");
        assert_eq!(field.next_repeat(), None);
    }

    #[test]
    fn test_take_returns_text_and_deactivates() {
        let mut field = TextField::new(true);
        field.activate("12");
        assert_eq!(field.take(), "12");
        assert!(!field.is_active());
        assert_eq!(field.text(), "");
    }
}
