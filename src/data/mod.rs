//! Data layer - widget engine state without rendering coupling
//!
//! Widgets, layouts, focus navigation, the frame player and the text field.
//! NO imports from frontend/ or any rendering code; frontends read these
//! structures to draw.

pub mod geometry;
pub mod input;
pub mod layout;
pub mod navigation;
pub mod player;
pub mod text_field;
pub mod widget;

pub use geometry::*;
pub use input::*;
pub use layout::*;
pub use navigation::*;
pub use player::*;
pub use text_field::*;
pub use widget::*;
