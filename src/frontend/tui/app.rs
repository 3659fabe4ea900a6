use crate::frontend::canvas::{BufferCanvas, Palette};
use crate::frontend::events::convert_event;
use crate::frontend::paint::{paint_session, ScreenAreas};
use crate::frontend::{Frontend, FrontendEvent};
use crate::core::Session;
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// TUI Frontend using ratatui
///
/// This frontend renders the session using ratatui (terminal UI library)
/// and handles events via crossterm.
pub struct TuiFrontend {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    poll_timeout: Duration,
    palette: Palette,
    panel_width: u16,
    /// Terminal reports key releases on its own
    keyboard_enhanced: bool,
    restored: bool,
}

impl TuiFrontend {
    /// Create a new TUI frontend
    ///
    /// Initializes terminal in raw mode, enables mouse capture, and enters alternate screen.
    /// Key release reporting is requested when the terminal supports it.
    pub fn new(palette: Palette, panel_width: u16) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal")?;

        let keyboard_enhanced = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        tracing::info!(keyboard_enhanced, "terminal initialized");

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor()?;

        Ok(Self {
            terminal,
            poll_timeout: Duration::from_millis(16), // ~60 FPS
            palette,
            panel_width,
            keyboard_enhanced,
            restored: false,
        })
    }
}

impl Frontend for TuiFrontend {
    fn poll_events(&mut self) -> Result<Vec<FrontendEvent>> {
        let mut events = Vec::new();
        let synthesize_release = !self.keyboard_enhanced;

        // Block for the first event only, then drain what is already queued
        let mut timeout = self.poll_timeout;
        while event::poll(timeout)? {
            let ev = event::read().context("Failed to read terminal event")?;
            events.extend(convert_event(ev, synthesize_release));
            timeout = Duration::ZERO;
        }

        Ok(events)
    }

    fn set_poll_timeout(&mut self, timeout: Duration) {
        self.poll_timeout = timeout;
    }

    fn render(&mut self, session: &mut Session) -> Result<()> {
        let size = self.terminal.size()?;
        let areas = ScreenAreas::split(size.width, size.height, self.panel_width);
        session.set_panel_origin(areas.panel.x, areas.panel.y);

        let palette = self.palette;
        let session = &*session;
        self.terminal.draw(|f| {
            let mut canvas = BufferCanvas::new(f.buffer_mut());
            paint_session(&mut canvas, session, &palette, &areas);
        })?;

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        // Restore terminal
        if self.keyboard_enhanced {
            let _ = execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags);
        }
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TuiFrontend {
    fn drop(&mut self) {
        // Ensure terminal is restored even if cleanup() wasn't called
        let _ = self.cleanup();
    }
}
