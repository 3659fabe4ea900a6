//! Layouts - ordered, keyed groups of widgets sharing placement and a
//! selection policy.
//!
//! A layout is built once per configuration and owns its widgets. Keys are
//! the labels the widgets were created with; a widget may change its display
//! label later (the play button does) without changing its key.

use crate::data::geometry::{Bounds, HoverStyle};
use crate::data::input::{InputEvent, PointerState};
use crate::data::widget::Widget;
use crate::error::{ViewerError, ViewerResult};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "row" => Ok(Self::Horizontal),
            "vertical" | "column" => Ok(Self::Vertical),
            other => Err(ViewerError::invalid(format!(
                "unknown orientation '{}'",
                other
            ))),
        }
    }
}

/// What an activation does to the `active` flags of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Radio group: the activated member becomes the only active one
    Exclusive,
    /// Checkboxes: the activated member toggles
    Multi,
    /// Plain buttons: activations are reported, flags never change
    Momentary,
}

impl FromStr for SelectionPolicy {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(Self::Exclusive),
            "multi" | "multiple" => Ok(Self::Multi),
            "momentary" | "buttons" => Ok(Self::Momentary),
            other => Err(ViewerError::invalid(format!(
                "unknown selection policy '{}'",
                other
            ))),
        }
    }
}

/// Everything needed to build a [`Layout`]
#[derive(Debug, Clone)]
pub struct LayoutSpec {
    pub name: String,
    pub labels: Vec<String>,
    /// Positions of initially active members
    pub active: Vec<usize>,
    /// Distance between neighbouring widget centers
    pub distance: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Treat (x, y) as the middle of the row/column instead of its first widget
    pub center: bool,
    pub orientation: Orientation,
    pub policy: SelectionPolicy,
    pub hover: HoverStyle,
}

impl LayoutSpec {
    pub fn new<S: Into<String>>(name: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            active: Vec::new(),
            distance: 8,
            x: 0,
            y: 0,
            width: 6,
            height: 3,
            center: true,
            orientation: Orientation::Horizontal,
            policy: SelectionPolicy::Exclusive,
            hover: HoverStyle::default(),
        }
    }

    pub fn active(mut self, active: impl IntoIterator<Item = usize>) -> Self {
        self.active = active.into_iter().collect();
        self
    }

    pub fn distance(mut self, distance: i32) -> Self {
        self.distance = distance;
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn centered(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hover(mut self, hover: HoverStyle) -> Self {
        self.hover = hover;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    name: String,
    widgets: Vec<Widget>,
    keys: HashMap<String, usize>,
    policy: SelectionPolicy,
    locked: bool,
}

impl Layout {
    pub fn new(spec: LayoutSpec) -> ViewerResult<Self> {
        if spec.labels.is_empty() {
            return Err(ViewerError::invalid(format!(
                "layout '{}' has an empty label list",
                spec.name
            )));
        }
        if let Some(&bad) = spec.active.iter().find(|&&i| i >= spec.labels.len()) {
            return Err(ViewerError::invalid(format!(
                "layout '{}' marks member {} active but has only {} members",
                spec.name,
                bad,
                spec.labels.len()
            )));
        }
        if spec.policy == SelectionPolicy::Exclusive && spec.active.len() > 1 {
            return Err(ViewerError::invalid(format!(
                "exclusive layout '{}' starts with {} active members",
                spec.name,
                spec.active.len()
            )));
        }

        let mut start_x = spec.x;
        let mut start_y = spec.y;
        if spec.center {
            let half_length = (spec.labels.len() as i32 - 1) * spec.distance / 2;
            match spec.orientation {
                Orientation::Horizontal => start_x -= half_length,
                Orientation::Vertical => start_y -= half_length,
            }
        }

        let mut widgets = Vec::with_capacity(spec.labels.len());
        let mut keys = HashMap::with_capacity(spec.labels.len());
        let (mut next_x, mut next_y) = (start_x, start_y);
        for (i, label) in spec.labels.iter().enumerate() {
            if keys.insert(label.clone(), i).is_some() {
                return Err(ViewerError::invalid(format!(
                    "layout '{}' has duplicate label '{}'",
                    spec.name, label
                )));
            }
            widgets.push(
                Widget::new(
                    label.clone(),
                    next_x,
                    next_y,
                    spec.width,
                    spec.height,
                    spec.active.contains(&i),
                )
                .with_hover(spec.hover),
            );
            match spec.orientation {
                Orientation::Horizontal => next_x += spec.distance,
                Orientation::Vertical => next_y += spec.distance,
            }
        }

        Ok(Self {
            name: spec.name,
            widgets,
            keys,
            policy: spec.policy,
            locked: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    /// Position of the widget created with `key`
    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    pub fn by_key(&self, key: &str) -> ViewerResult<&Widget> {
        self.position(key)
            .map(|i| &self.widgets[i])
            .ok_or_else(|| ViewerError::not_found("widget", format!("{}/{}", self.name, key)))
    }

    pub fn by_key_mut(&mut self, key: &str) -> ViewerResult<&mut Widget> {
        match self.position(key) {
            Some(i) => Ok(&mut self.widgets[i]),
            None => Err(ViewerError::not_found(
                "widget",
                format!("{}/{}", self.name, key),
            )),
        }
    }

    pub fn by_index(&self, index: usize) -> ViewerResult<&Widget> {
        self.widgets
            .get(index)
            .ok_or_else(|| ViewerError::not_found("widget", format!("{}#{}", self.name, index)))
    }

    pub fn by_index_mut(&mut self, index: usize) -> ViewerResult<&mut Widget> {
        let name = &self.name;
        self.widgets
            .get_mut(index)
            .ok_or_else(|| ViewerError::not_found("widget", format!("{}#{}", name, index)))
    }

    /// Feed one event to the members in insertion order. The first member
    /// that fires applies the selection policy and ends the pass; only one
    /// widget reacts to a single event.
    pub fn update(&mut self, event: &InputEvent, pointer: &PointerState) -> bool {
        for widget in &mut self.widgets {
            widget.clear_action();
        }

        let Some(fired) = self
            .widgets
            .iter_mut()
            .position(|w| w.resolve_action(event, pointer))
        else {
            return false;
        };

        match self.policy {
            SelectionPolicy::Exclusive => {
                self.deactivate_all();
                self.widgets[fired].set_active(true);
            }
            SelectionPolicy::Multi => {
                let widget = &mut self.widgets[fired];
                widget.set_active(!widget.is_active());
            }
            SelectionPolicy::Momentary => {}
        }
        tracing::debug!(
            layout = %self.name,
            member = %self.widgets[fired].label(),
            "layout updated"
        );
        true
    }

    /// Members with `active` set, in insertion order
    pub fn active_members(&self) -> Vec<&Widget> {
        self.widgets.iter().filter(|w| w.is_active()).collect()
    }

    /// The one active member. Exclusive layouts do not guarantee a member is
    /// active, so an empty selection is reported rather than guessed.
    pub fn single_active(&self) -> ViewerResult<&Widget> {
        self.widgets
            .iter()
            .find(|w| w.is_active())
            .ok_or_else(|| ViewerError::EmptySelection(self.name.clone()))
    }

    /// Member whose activation was detected by the last update
    pub fn fired(&self) -> Option<(usize, &Widget)> {
        self.widgets.iter().enumerate().find(|(_, w)| w.action())
    }

    pub fn deactivate_all(&mut self) {
        for widget in &mut self.widgets {
            widget.set_active(false);
        }
    }

    pub fn lock(&mut self) {
        self.locked = true;
        for widget in &mut self.widgets {
            widget.lock();
        }
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        for widget in &mut self.widgets {
            widget.unlock();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Rest area covered by all members
    pub fn bounds(&self) -> Bounds {
        self.widgets
            .iter()
            .map(Widget::rest_bounds)
            .reduce(Bounds::union)
            .unwrap_or_default()
    }
}

pub fn find_layout<'a>(layouts: &'a [Layout], name: &str) -> ViewerResult<&'a Layout> {
    layouts
        .iter()
        .find(|l| l.name() == name)
        .ok_or_else(|| ViewerError::not_found("layout", name))
}

pub fn find_layout_mut<'a>(layouts: &'a mut [Layout], name: &str) -> ViewerResult<&'a mut Layout> {
    layouts
        .iter_mut()
        .find(|l| l.name() == name)
        .ok_or_else(|| ViewerError::not_found("layout", name))
}
