//! Frontend abstraction layer
//!
//! This module defines the `Frontend` trait the host loop drives. It provides
//! a unified interface for event polling, rendering, and cleanup; the only
//! implementation today is the terminal frontend.

pub mod canvas;
pub mod events;
pub mod paint;
pub mod tui;

use crate::core::Session;
use anyhow::Result;
use std::time::Duration;

pub use canvas::{BufferCanvas, Canvas, Palette};
pub use events::FrontendEvent;
pub use tui::TuiFrontend;

/// Frontend trait - event source and renderer for a [`Session`]
pub trait Frontend {
    /// Poll for user input events
    ///
    /// Waits at most the current poll timeout for the first event, then
    /// drains whatever else is pending, converted to `FrontendEvent`s.
    ///
    /// # Returns
    /// - `Ok(Vec<FrontendEvent>)` - List of events (empty if no events)
    /// - `Err(...)` - If event polling failed
    fn poll_events(&mut self) -> Result<Vec<FrontendEvent>>;

    /// How long the next `poll_events` may block
    fn set_poll_timeout(&mut self, timeout: Duration);

    /// Render the current session state
    ///
    /// Mutable because the frontend records where it placed the control
    /// panel so pointer positions can be made panel-local.
    fn render(&mut self, session: &mut Session) -> Result<()>;

    /// Cleanup and shutdown the frontend
    ///
    /// Restores the terminal. Safe to call more than once.
    fn cleanup(&mut self) -> Result<()>;
}
