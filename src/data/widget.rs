//! Widget state machine - one clickable/keyboard-activatable control.
//!
//! A widget never draws itself. It owns its flags and answers three
//! questions for the frontend: did an activation just happen
//! ([`Widget::resolve_action`]), which color state is it in
//! ([`Widget::visual_state`]), and where should its body be drawn this frame
//! ([`Widget::layout_geometry`]).

use crate::data::geometry::{Bounds, HoverStyle};
use crate::data::input::{InputEvent, PointerState};
use crossterm::event::KeyCode;

/// Key that activates the focused widget
pub const CONFIRM_KEY: KeyCode = KeyCode::Enter;

/// Color state of a widget, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualState {
    ActiveCurrent,
    Current,
    Active,
    Inactive,
}

#[derive(Debug, Clone)]
pub struct Widget {
    label: String,
    center_x: i32,
    center_y: i32,
    width: i32,
    height: i32,
    hover: HoverStyle,

    /// Primary button went down inside and has not been released yet
    clicked: bool,
    /// Confirm key went down while focused and has not come up yet
    pressed: bool,
    current: bool,
    active: bool,
    locked: bool,
    /// Activation detected by the most recent resolve pass
    action: bool,
}

impl Widget {
    pub fn new(
        label: impl Into<String>,
        center_x: i32,
        center_y: i32,
        width: i32,
        height: i32,
        active: bool,
    ) -> Self {
        Self {
            label: label.into(),
            center_x,
            center_y,
            width,
            height,
            hover: HoverStyle::default(),
            clicked: false,
            pressed: false,
            current: false,
            active,
            locked: false,
            action: false,
        }
    }

    pub fn with_hover(mut self, hover: HoverStyle) -> Self {
        self.hover = hover;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_y)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Force the active flag. Bypasses selection policy and locks on purpose:
    /// application rules use this to pin locked members to a fixed state.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn set_current(&mut self, current: bool) {
        self.current = current;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock the widget. Pending press latches are dropped so nothing fires
    /// once the widget is unlocked again.
    pub fn lock(&mut self) {
        self.locked = true;
        self.clicked = false;
        self.pressed = false;
        self.action = false;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn action(&self) -> bool {
        self.action
    }

    pub fn clear_action(&mut self) {
        self.action = false;
    }

    /// Held down by pointer or keyboard
    pub fn is_down(&self) -> bool {
        self.clicked || self.pressed
    }

    /// Geometry at rest; also the clickable hitbox
    pub fn rest_bounds(&self) -> Bounds {
        Bounds::from_center(self.center_x, self.center_y, self.width, self.height)
    }

    /// Pointer activation: fires on primary release when both the press
    /// origin and the release position are inside the hitbox.
    pub fn detect_pointer_activation(&mut self, pointer: &PointerState) -> bool {
        let hitbox = self.rest_bounds();

        if pointer.primary_down {
            let pressed_inside = pointer
                .press_origin
                .is_some_and(|(x, y)| hitbox.contains(x, y));
            if pressed_inside && !self.clicked {
                self.clicked = true;
            }
            return false;
        }

        if self.clicked {
            self.clicked = false;
            return hitbox.contains(pointer.x, pointer.y);
        }
        false
    }

    /// Keyboard activation: confirm key down latches, the matching key up
    /// fires once. Only the focused widget listens.
    pub fn detect_key_activation(&mut self, event: &InputEvent) -> bool {
        if !self.current {
            return false;
        }
        if event.is_key_down(CONFIRM_KEY) {
            self.pressed = true;
        } else if event.is_key_up(CONFIRM_KEY) && self.pressed {
            self.pressed = false;
            return true;
        }
        false
    }

    /// Run both detectors and record the outcome in `action`.
    pub fn resolve_action(&mut self, event: &InputEvent, pointer: &PointerState) -> bool {
        if self.locked {
            self.action = false;
            return false;
        }
        let by_key = self.detect_key_activation(event);
        let by_pointer = self.detect_pointer_activation(pointer);
        self.action = by_key || by_pointer;
        if self.action {
            tracing::debug!(
                label = %self.label,
                by_key,
                by_pointer,
                "widget activated"
            );
        }
        self.action
    }

    pub fn visual_state(&self) -> VisualState {
        if self.active && self.current {
            VisualState::ActiveCurrent
        } else if self.current {
            VisualState::Current
        } else if self.active {
            VisualState::Active
        } else {
            VisualState::Inactive
        }
    }

    /// Body rectangle for this frame: sinks while held, pops up and grows
    /// while hovered or focused. Locked widgets stay at rest.
    pub fn layout_geometry(&self, pointer: &PointerState) -> Bounds {
        let rest = self.rest_bounds();
        if self.locked {
            return rest;
        }
        if self.is_down() {
            return rest.offset(0, self.hover.press_shift);
        }
        if self.current || rest.contains(pointer.x, pointer.y) {
            return Bounds::from_center(
                self.center_x,
                self.center_y - self.hover.pop,
                self.width + self.hover.grow_x,
                self.height + self.hover.grow_y,
            );
        }
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Widget {
        // Spans x 7..13, y 4..7
        Widget::new("OK", 10, 5, 6, 3, false)
    }

    fn pointer_at(x: i32, y: i32, down: bool, origin: Option<(i32, i32)>) -> PointerState {
        PointerState {
            x,
            y,
            primary_down: down,
            press_origin: origin,
        }
    }

    #[test]
    fn test_click_inside_fires_once_on_release() {
        let mut w = button();
        let idle = InputEvent::pointer_move(0, 0);

        assert!(!w.resolve_action(&idle, &pointer_at(9, 5, true, Some((9, 5)))));
        assert!(w.is_down());
        assert!(w.resolve_action(&idle, &pointer_at(9, 5, false, Some((9, 5)))));
        assert!(w.action());
        assert!(!w.is_down());

        // Next frame: not sticky
        assert!(!w.resolve_action(&idle, &pointer_at(9, 5, false, Some((9, 5)))));
        assert!(!w.action());
    }

    #[test]
    fn test_release_outside_does_not_fire() {
        let mut w = button();
        let idle = InputEvent::pointer_move(0, 0);
        w.resolve_action(&idle, &pointer_at(9, 5, true, Some((9, 5))));
        assert!(!w.resolve_action(&idle, &pointer_at(30, 5, false, Some((9, 5)))));
        // Latch cleared by the release
        assert!(!w.is_down());
    }

    #[test]
    fn test_press_outside_then_drag_in_does_not_fire() {
        let mut w = button();
        let idle = InputEvent::pointer_move(0, 0);
        w.resolve_action(&idle, &pointer_at(9, 5, true, Some((30, 5))));
        assert!(!w.is_down());
        assert!(!w.resolve_action(&idle, &pointer_at(9, 5, false, Some((30, 5)))));
    }

    #[test]
    fn test_confirm_key_requires_focus() {
        let mut w = button();
        let pointer = PointerState::default();
        assert!(!w.resolve_action(&InputEvent::key_down(KeyCode::Enter), &pointer));
        assert!(!w.resolve_action(&InputEvent::key_up(KeyCode::Enter), &pointer));

        w.set_current(true);
        assert!(!w.resolve_action(&InputEvent::key_down(KeyCode::Enter), &pointer));
        // Held key repeats are idempotent
        assert!(!w.resolve_action(&InputEvent::key_down(KeyCode::Enter), &pointer));
        assert!(w.is_down());
        assert!(w.resolve_action(&InputEvent::key_up(KeyCode::Enter), &pointer));
        // Second key up without a new key down does nothing
        assert!(!w.resolve_action(&InputEvent::key_up(KeyCode::Enter), &pointer));
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut w = button();
        w.set_current(true);
        let pointer = PointerState::default();
        w.resolve_action(&InputEvent::key_down(KeyCode::Char(' ')), &pointer);
        assert!(!w.resolve_action(&InputEvent::key_up(KeyCode::Char(' ')), &pointer));
    }

    #[test]
    fn test_locked_widget_never_fires() {
        let mut w = button();
        w.set_current(true);
        let pointer = PointerState::default();
        w.resolve_action(&InputEvent::key_down(KeyCode::Enter), &pointer);
        w.lock();
        assert!(!w.resolve_action(&InputEvent::key_up(KeyCode::Enter), &pointer));

        // The latch taken before locking does not survive an unlock
        w.unlock();
        assert!(!w.resolve_action(&InputEvent::key_up(KeyCode::Enter), &pointer));
    }

    #[test]
    fn test_visual_state_priority() {
        let mut w = button();
        assert_eq!(w.visual_state(), VisualState::Inactive);
        w.set_active(true);
        assert_eq!(w.visual_state(), VisualState::Active);
        w.set_current(true);
        assert_eq!(w.visual_state(), VisualState::ActiveCurrent);
        w.set_active(false);
        assert_eq!(w.visual_state(), VisualState::Current);
    }

    #[test]
    fn test_geometry_feedback() {
        let mut w = button();
        let away = PointerState::default();
        assert_eq!(w.layout_geometry(&away), w.rest_bounds());

        // Hover grows and pops up
        let over = pointer_at(10, 5, false, None);
        assert_eq!(w.layout_geometry(&over), Bounds::from_center(10, 4, 8, 3));

        // Focus behaves like hover
        w.set_current(true);
        assert_eq!(w.layout_geometry(&away), Bounds::from_center(10, 4, 8, 3));

        // Held down sinks, taking priority over hover
        w.resolve_action(
            &InputEvent::pointer_move(0, 0),
            &pointer_at(10, 5, true, Some((10, 5))),
        );
        assert_eq!(w.layout_geometry(&over), w.rest_bounds().offset(0, 1));
    }

    #[test]
    fn test_locked_geometry_stays_at_rest() {
        let mut w = button();
        w.set_current(true);
        w.lock();
        let over = pointer_at(10, 5, false, None);
        assert_eq!(w.layout_geometry(&over), w.rest_bounds());
    }

    #[test]
    fn test_forced_active_bypasses_lock() {
        let mut w = button();
        w.lock();
        w.set_active(true);
        assert!(w.is_active());
    }
}
