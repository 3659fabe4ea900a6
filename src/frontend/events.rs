//! Translation from crossterm's event stream into engine input events.
//!
//! Terminals only report key releases when keyboard enhancement is active.
//! Without it a key-up is synthesized right after each key-down so widgets
//! that fire on release still work.

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};

pub use crate::data::input::InputEvent as FrontendEvent;

/// Convert one crossterm event. `synthesize_release` is set when the
/// terminal cannot report key releases itself.
pub fn convert_event(event: Event, synthesize_release: bool) -> Vec<FrontendEvent> {
    match event {
        Event::Key(key_event) => match key_event.kind {
            // Raw mode swallows SIGINT
            KeyEventKind::Press
                if key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                vec![FrontendEvent::Quit]
            }
            KeyEventKind::Press => {
                let down = FrontendEvent::KeyDown {
                    code: key_event.code,
                    modifiers: key_event.modifiers,
                };
                if synthesize_release {
                    vec![
                        down,
                        FrontendEvent::KeyUp {
                            code: key_event.code,
                            modifiers: key_event.modifiers,
                        },
                    ]
                } else {
                    vec![down]
                }
            }
            KeyEventKind::Release => vec![FrontendEvent::KeyUp {
                code: key_event.code,
                modifiers: key_event.modifiers,
            }],
            // Held keys are timed by the widgets themselves
            KeyEventKind::Repeat => Vec::new(),
        },
        Event::Mouse(mouse_event) => {
            let (x, y) = (mouse_event.column, mouse_event.row);
            match mouse_event.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    vec![FrontendEvent::pointer_button(x, y, true)]
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    vec![FrontendEvent::pointer_button(x, y, false)]
                }
                MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                    vec![FrontendEvent::pointer_move(x, y)]
                }
                _ => Vec::new(),
            }
        }
        Event::Resize(width, height) => vec![FrontendEvent::Resize { width, height }],
        _ => Vec::new(),
    }
}
