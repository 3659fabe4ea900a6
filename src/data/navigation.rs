//! Keyboard focus across layouts.
//!
//! Exactly one widget among the governed layouts carries `current`. Arrow
//! keys move within a layout; an override table redirects specific
//! (layout, widget, key) triples anywhere else.

use crate::data::input::InputEvent;
use crate::data::layout::Layout;
use crate::error::{ViewerError, ViewerResult};
use crossterm::event::KeyCode;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub layout: usize,
    pub widget: usize,
}

impl Cursor {
    pub fn new(layout: usize, widget: usize) -> Self {
        Self { layout, widget }
    }
}

pub type NavigationOverrides = HashMap<(usize, usize, KeyCode), Cursor>;

#[derive(Debug, Clone)]
pub struct Navigation {
    cursor: Cursor,
    sizes: Vec<usize>,
    overrides: NavigationOverrides,
}

impl Navigation {
    /// Govern `layouts`, focusing the first widget of the first layout.
    pub fn new(layouts: &mut [Layout], overrides: NavigationOverrides) -> ViewerResult<Self> {
        let sizes: Vec<usize> = layouts.iter().map(Layout::len).collect();
        if sizes.is_empty() || sizes.contains(&0) {
            return Err(ViewerError::invalid("navigation needs non-empty layouts"));
        }
        for (&(layout, widget, key), target) in &overrides {
            let in_range = |c: Cursor| c.layout < sizes.len() && c.widget < sizes[c.layout];
            if !in_range(Cursor::new(layout, widget)) || !in_range(*target) {
                return Err(ViewerError::invalid(format!(
                    "navigation override ({}, {}, {:?}) -> ({}, {}) is out of range",
                    layout, widget, key, target.layout, target.widget
                )));
            }
        }

        for layout in layouts.iter_mut() {
            for widget in 0..layout.len() {
                if let Ok(w) = layout.by_index_mut(widget) {
                    w.set_current(false);
                }
            }
        }
        layouts[0].by_index_mut(0)?.set_current(true);

        Ok(Self {
            cursor: Cursor::default(),
            sizes,
            overrides,
        })
    }

    /// Like [`Navigation::new`], with overrides that let the arrows flow
    /// from one layout into the next and Tab/BackTab jump between layouts.
    pub fn with_layout_chaining(layouts: &mut [Layout]) -> ViewerResult<Self> {
        let sizes: Vec<usize> = layouts.iter().map(Layout::len).collect();
        let overrides = chained_overrides(&sizes);
        Self::new(layouts, overrides)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor for a key-down. Returns true when it moved.
    pub fn advance(&mut self, event: &InputEvent) -> bool {
        let InputEvent::KeyDown { code, .. } = *event else {
            return false;
        };
        let old = self.cursor;

        if let Some(target) = self
            .overrides
            .get(&(self.cursor.layout, self.cursor.widget, code))
        {
            self.cursor = *target;
        } else {
            let last = self.sizes[self.cursor.layout] - 1;
            match code {
                KeyCode::Down | KeyCode::Right => {
                    self.cursor.widget = (self.cursor.widget + 1).min(last);
                }
                KeyCode::Up | KeyCode::Left => {
                    self.cursor.widget = self.cursor.widget.saturating_sub(1);
                }
                _ => {}
            }
        }

        if self.cursor != old {
            tracing::debug!(
                from = ?(old.layout, old.widget),
                to = ?(self.cursor.layout, self.cursor.widget),
                "focus moved"
            );
        }
        self.cursor != old
    }

    /// Move `current` from the old cursor to the new one.
    pub fn update(&mut self, event: &InputEvent, layouts: &mut [Layout]) -> bool {
        self.set_current_flag(layouts, false);
        let moved = self.advance(event);
        self.set_current_flag(layouts, true);
        moved
    }

    fn set_current_flag(&self, layouts: &mut [Layout], current: bool) {
        if let Some(widget) = layouts
            .get_mut(self.cursor.layout)
            .and_then(|l| l.by_index_mut(self.cursor.widget).ok())
        {
            widget.set_current(current);
        }
    }
}

/// Overrides that chain consecutive layouts: stepping past the last widget
/// of a layout enters the next one, stepping before the first re-enters the
/// previous one at its end. Tab and BackTab cycle through layouts.
pub fn chained_overrides(sizes: &[usize]) -> NavigationOverrides {
    let mut overrides = HashMap::new();
    let count = sizes.len();
    for (layout, &size) in sizes.iter().enumerate() {
        if size == 0 {
            continue;
        }
        if layout + 1 < count && sizes[layout + 1] > 0 {
            let next = Cursor::new(layout + 1, 0);
            overrides.insert((layout, size - 1, KeyCode::Down), next);
            overrides.insert((layout, size - 1, KeyCode::Right), next);
        }
        if layout > 0 && sizes[layout - 1] > 0 {
            let prev = Cursor::new(layout - 1, sizes[layout - 1] - 1);
            overrides.insert((layout, 0, KeyCode::Up), prev);
            overrides.insert((layout, 0, KeyCode::Left), prev);
        }
        if count > 1 {
            let next_layout = (layout + 1) % count;
            let prev_layout = (layout + count - 1) % count;
            for widget in 0..size {
                overrides.insert((layout, widget, KeyCode::Tab), Cursor::new(next_layout, 0));
                overrides.insert(
                    (layout, widget, KeyCode::BackTab),
                    Cursor::new(prev_layout, 0),
                );
            }
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::layout::LayoutSpec;
    use proptest::prelude::*;

    fn layouts() -> Vec<Layout> {
        vec![
            Layout::new(LayoutSpec::new("coarse", ["0", "64"])).unwrap(),
            Layout::new(LayoutSpec::new("fine", ["16", "32", "64", "128"])).unwrap(),
        ]
    }

    fn current_cells(layouts: &[Layout]) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for (li, layout) in layouts.iter().enumerate() {
            for (wi, widget) in layout.widgets().iter().enumerate() {
                if widget.is_current() {
                    cells.push((li, wi));
                }
            }
        }
        cells
    }

    fn down(code: KeyCode) -> InputEvent {
        InputEvent::key_down(code)
    }

    #[test]
    fn test_starts_on_first_widget() {
        let mut ls = layouts();
        let nav = Navigation::new(&mut ls, HashMap::new()).unwrap();
        assert_eq!(nav.cursor(), Cursor::new(0, 0));
        assert_eq!(current_cells(&ls), vec![(0, 0)]);
    }

    #[test]
    fn test_arrows_clamp_within_layout() {
        let mut ls = layouts();
        let mut nav = Navigation::new(&mut ls, HashMap::new()).unwrap();
        assert!(!nav.update(&down(KeyCode::Up), &mut ls));
        assert!(nav.update(&down(KeyCode::Right), &mut ls));
        assert!(!nav.update(&down(KeyCode::Down), &mut ls));
        assert_eq!(current_cells(&ls), vec![(0, 1)]);
        assert!(nav.update(&down(KeyCode::Left), &mut ls));
        assert_eq!(current_cells(&ls), vec![(0, 0)]);
    }

    #[test]
    fn test_only_key_down_moves() {
        let mut ls = layouts();
        let mut nav = Navigation::new(&mut ls, HashMap::new()).unwrap();
        assert!(!nav.update(&InputEvent::key_up(KeyCode::Right), &mut ls));
        assert!(!nav.update(&InputEvent::pointer_move(3, 3), &mut ls));
        assert!(!nav.update(&down(KeyCode::Char('x')), &mut ls));
        assert_eq!(nav.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_override_jumps_between_layouts() {
        let mut ls = layouts();
        let mut overrides = HashMap::new();
        overrides.insert((0, 1, KeyCode::Down), Cursor::new(1, 3));
        let mut nav = Navigation::new(&mut ls, overrides).unwrap();
        nav.update(&down(KeyCode::Right), &mut ls);
        nav.update(&down(KeyCode::Down), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(1, 3));
        assert_eq!(current_cells(&ls), vec![(1, 3)]);
    }

    #[test]
    fn test_rejects_out_of_range_override() {
        let mut ls = layouts();
        let mut overrides = HashMap::new();
        overrides.insert((0, 0, KeyCode::Down), Cursor::new(1, 9));
        assert!(matches!(
            Navigation::new(&mut ls, overrides),
            Err(ViewerError::InvalidConfiguration(_))
        ));
        assert!(Navigation::new(&mut [], HashMap::new()).is_err());
    }

    #[test]
    fn test_layout_chaining() {
        let mut ls = layouts();
        let mut nav = Navigation::with_layout_chaining(&mut ls).unwrap();
        nav.update(&down(KeyCode::Down), &mut ls);
        nav.update(&down(KeyCode::Down), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(1, 0));
        nav.update(&down(KeyCode::Up), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(0, 1));

        nav.update(&down(KeyCode::Tab), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(1, 0));
        nav.update(&down(KeyCode::Tab), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(0, 0));
        nav.update(&down(KeyCode::BackTab), &mut ls);
        assert_eq!(nav.cursor(), Cursor::new(1, 0));

        // End of the last layout stays put
        for _ in 0..6 {
            nav.update(&down(KeyCode::Right), &mut ls);
        }
        assert_eq!(nav.cursor(), Cursor::new(1, 3));
    }

    fn arb_key() -> impl Strategy<Value = KeyCode> {
        prop_oneof![
            Just(KeyCode::Up),
            Just(KeyCode::Down),
            Just(KeyCode::Left),
            Just(KeyCode::Right),
            Just(KeyCode::Tab),
            Just(KeyCode::BackTab),
            Just(KeyCode::Enter),
        ]
    }

    proptest! {
        #[test]
        fn exactly_one_current(keys in proptest::collection::vec((arb_key(), any::<bool>()), 0..80)) {
            let mut ls = layouts();
            let mut nav = Navigation::with_layout_chaining(&mut ls).unwrap();
            for (key, pressed) in keys {
                let event = if pressed { InputEvent::key_down(key) } else { InputEvent::key_up(key) };
                nav.update(&event, &mut ls);
                let cells = current_cells(&ls);
                prop_assert_eq!(cells.len(), 1);
                prop_assert_eq!(cells[0], (nav.cursor().layout, nav.cursor().widget));
            }
        }
    }
}
