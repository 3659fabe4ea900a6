//! Input events and pointer state as seen by the widget engine.
//!
//! Frontends translate their native event streams into [`InputEvent`] so the
//! engine only handles one event shape. Positions in events are absolute
//! terminal cells; [`PointerState`] holds the same position translated into
//! control-panel coordinates, which is what widgets hit-test against.

use crossterm::event::{KeyCode, KeyModifiers};

/// Discrete input event delivered once per poll iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer moved (with or without a button held)
    PointerMove { x: u16, y: u16 },
    /// Primary pointer button changed state
    PointerButton { x: u16, y: u16, pressed: bool },
    /// Key went down
    KeyDown { code: KeyCode, modifiers: KeyModifiers },
    /// Key came back up
    KeyUp { code: KeyCode, modifiers: KeyModifiers },
    /// Terminal/window resize
    Resize { width: u16, height: u16 },
    /// Window close / quit request
    Quit,
}

impl InputEvent {
    pub fn key_down(code: KeyCode) -> Self {
        Self::KeyDown {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn key_up(code: KeyCode) -> Self {
        Self::KeyUp {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn pointer_move(x: u16, y: u16) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn pointer_button(x: u16, y: u16, pressed: bool) -> Self {
        Self::PointerButton { x, y, pressed }
    }

    /// True for a key-down of exactly `code`
    pub fn is_key_down(&self, code: KeyCode) -> bool {
        matches!(self, Self::KeyDown { code: c, .. } if *c == code)
    }

    /// True for a key-up of exactly `code`
    pub fn is_key_up(&self, code: KeyCode) -> bool {
        matches!(self, Self::KeyUp { code: c, .. } if *c == code)
    }

    /// Absolute position carried by pointer events
    pub fn position(&self) -> Option<(u16, u16)> {
        match self {
            Self::PointerMove { x, y } | Self::PointerButton { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Last known pointer position and primary-button state, in panel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
    pub primary_down: bool,
    /// Where the current (or most recent) primary press started
    pub press_origin: Option<(i32, i32)>,
}

impl PointerState {
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn press(&mut self, x: i32, y: i32) {
        self.move_to(x, y);
        self.primary_down = true;
        self.press_origin = Some((x, y));
    }

    pub fn release(&mut self, x: i32, y: i32) {
        self.move_to(x, y);
        self.primary_down = false;
    }

    /// Fold a pointer event into the state. `origin` is the panel origin in
    /// absolute cells; non-pointer events leave the state untouched.
    pub fn apply(&mut self, event: &InputEvent, origin: (i32, i32)) {
        match *event {
            InputEvent::PointerMove { x, y } => {
                self.move_to(x as i32 - origin.0, y as i32 - origin.1);
            }
            InputEvent::PointerButton { x, y, pressed } => {
                let (px, py) = (x as i32 - origin.0, y as i32 - origin.1);
                if pressed {
                    self.press(px, py);
                } else {
                    self.release(px, py);
                }
            }
            _ => {}
        }
    }
}
