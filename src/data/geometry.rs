//! Integer rectangles in terminal cells.

/// Axis-aligned rectangle, top-left anchored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on (cx, cy)
    pub fn from_center(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self::new(cx - width / 2, cy - height / 2, width, height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest rectangle covering both
    pub fn union(self, other: Bounds) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Pointer/focus feedback applied on top of a widget's rest geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverStyle {
    /// Extra columns while hovered or focused
    pub grow_x: i32,
    /// Extra rows while hovered or focused
    pub grow_y: i32,
    /// Rows the body pops up while hovered or focused
    pub pop: i32,
    /// Rows the body sinks while held down
    pub press_shift: i32,
}

impl HoverStyle {
    /// No hover affordance; press feedback only
    pub fn flat() -> Self {
        Self {
            grow_x: 0,
            grow_y: 0,
            pop: 0,
            press_shift: 1,
        }
    }
}

impl Default for HoverStyle {
    fn default() -> Self {
        Self {
            grow_x: 2,
            grow_y: 0,
            pop: 1,
            press_shift: 1,
        }
    }
}
