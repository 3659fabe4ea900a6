//! Session - the context object the host loop drives.
//!
//! Holds every scene (built eagerly at startup), which one is shown, the
//! pointer in panel coordinates, the jump-to-frame field and the running
//! flag. Frontends feed it [`InputEvent`]s and read it back to draw.

use crate::assets::{DirectoryFrameSource, FrameStore};
use crate::config::Config;
use crate::core::scene::{build_models, LayoutRole, Scene};
use crate::data::input::{InputEvent, PointerState};
use crate::data::player::Direction;
use crate::data::text_field::TextField;
use crate::error::{ViewerError, ViewerResult};
use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use std::time::{Duration, Instant};

pub struct Session {
    scenes: Vec<Scene>,
    active: usize,
    pointer: PointerState,
    /// Top-left of the control panel in terminal cells
    panel_origin: (i32, i32),
    jump_field: TextField,
    status: Option<String>,
    running: bool,
}

impl Session {
    pub fn new(scenes: Vec<Scene>, initial: usize) -> ViewerResult<Self> {
        if scenes.is_empty() {
            return Err(ViewerError::invalid("no scenes to show"));
        }
        let mut session = Self {
            scenes,
            active: 0,
            pointer: PointerState::default(),
            panel_origin: (0, 0),
            jump_field: TextField::new(true),
            status: None,
            running: true,
        };
        session.switch_scene(initial.min(session.scenes.len() - 1));
        Ok(session)
    }

    pub fn scene(&self) -> &Scene {
        &self.scenes[self.active]
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn panel_origin(&self) -> (i32, i32) {
        self.panel_origin
    }

    /// Where the frontend placed the panel this frame
    pub fn set_panel_origin(&mut self, x: i32, y: i32) {
        self.panel_origin = (x, y);
    }

    pub fn jump_field(&self) -> &TextField {
        &self.jump_field
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Start autoplay on the shown scene
    pub fn start_playing(&mut self, now: Instant) {
        let scene = &mut self.scenes[self.active];
        if !scene.player().is_playing() {
            scene.toggle_play(now);
        }
    }

    pub fn switch_scene(&mut self, index: usize) {
        if index >= self.scenes.len() {
            return;
        }
        if index != self.active {
            self.scenes[self.active].stop();
            tracing::info!(
                from = %self.scenes[self.active].name(),
                to = %self.scenes[index].name(),
                "switching scene"
            );
        }
        self.active = index;
        self.scenes[index].mark_scene(index);
    }

    /// Fold one input event into the session.
    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) {
        self.pointer.apply(event, self.panel_origin);

        match event {
            InputEvent::Quit => {
                self.running = false;
                return;
            }
            InputEvent::Resize { .. } => return,
            _ => {}
        }

        if self.jump_field.is_active() && self.handle_jump_field(event, now) {
            return;
        }

        let pointer = self.pointer;
        let scene = &mut self.scenes[self.active];
        if let Some((index, role)) = scene.update_layouts(event, &pointer) {
            match role {
                LayoutRole::Scenes => {
                    if let Some(picked) = scene.picked_scene(index) {
                        self.switch_scene(picked);
                    }
                }
                LayoutRole::Selection => match scene.rebind() {
                    Ok(_) => self.status = None,
                    Err(e) => {
                        tracing::warn!("Dataset binding failed: {}", e);
                        self.status = Some(e.to_string());
                    }
                },
                LayoutRole::Transport => {
                    if let Some(direction) = scene.transport_direction(index) {
                        scene.step(direction);
                    }
                }
                LayoutRole::Play => {
                    scene.toggle_play(now);
                }
            }
            return;
        }

        if let InputEvent::KeyDown { code, .. } = *event {
            self.handle_global_key(code, now);
        }
    }

    fn handle_global_key(&mut self, code: KeyCode, now: Instant) {
        let scene = &mut self.scenes[self.active];
        match code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char(' ') => {
                scene.toggle_play(now);
            }
            KeyCode::Char(',') | KeyCode::PageUp => {
                scene.step(Direction::Previous);
            }
            KeyCode::Char('.') | KeyCode::PageDown => {
                scene.step(Direction::Next);
            }
            KeyCode::Home => {
                scene.seek(0);
            }
            KeyCode::End => {
                scene.seek(usize::MAX);
            }
            KeyCode::Char('g') => {
                scene.stop();
                self.jump_field.activate("");
                self.status = None;
            }
            _ => {}
        }
    }

    /// Returns true when the field consumed the event
    fn handle_jump_field(&mut self, event: &InputEvent, now: Instant) -> bool {
        match event {
            InputEvent::KeyDown {
                code: KeyCode::Esc,
                ..
            } => {
                self.jump_field.deactivate();
                true
            }
            InputEvent::KeyDown {
                code: KeyCode::Enter,
                ..
            } => {
                let text = self.jump_field.take();
                let scene = &mut self.scenes[self.active];
                match text.parse::<usize>() {
                    Ok(frame) if frame >= 1 => {
                        let shown = scene.seek(frame - 1) + 1;
                        self.status = Some(format!("Frame {}/{}", shown, scene.player().len()));
                    }
                    _ => {
                        self.status = Some(format!(
                            "Frame must be between 1 and {}",
                            scene.player().len()
                        ));
                    }
                }
                true
            }
            InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => {
                self.jump_field.handle_event(event, now);
                true
            }
            _ => false,
        }
    }

    /// Timers: autoplay and held backspace. Returns true when anything
    /// visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let edited = self.jump_field.tick(now);
        let stepped = self.scenes[self.active].tick(now);
        edited || stepped
    }

    /// How long the host may wait for input before the next timer is due
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        let play = self.scene().player().time_until_tick(now);
        let repeat = self
            .jump_field
            .next_repeat()
            .map(|due| due.saturating_duration_since(now));
        match (play, repeat) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Load every configured scene whose datasets are on disk. Scenes without
/// frames for their initial selection are skipped with a warning.
pub fn load_scenes(config: &Config) -> Result<Vec<Scene>> {
    let models = build_models(config).context("Invalid scene configuration")?;

    let mut kept = config.clone();
    kept.scenes.clear();
    let mut stores = Vec::new();
    for (def, mut model) in config.scenes.iter().zip(models) {
        let source = DirectoryFrameSource::new(config.dataset_dir(def), config.frames_subdir(def))
            .with_max_width(config.assets.max_frame_width);
        let mut store = FrameStore::new();
        if let Err(e) = store.preload(&source) {
            tracing::warn!("Skipping scene '{}': {}", def.name, e);
            continue;
        }
        match model.resolve_key() {
            Ok(key) if store.contains(&key) => {
                kept.scenes.push(def.clone());
                stores.push(store);
            }
            Ok(key) => {
                tracing::warn!(
                    "Skipping scene '{}': initial dataset '{}' not found in {:?}",
                    def.name,
                    key,
                    source.root()
                )
            }
            Err(e) => tracing::warn!("Skipping scene '{}': {}", def.name, e),
        }
    }
    if kept.scenes.is_empty() {
        anyhow::bail!("No scene has loadable datasets; check dataset_dir in the config");
    }

    let models = build_models(&kept).context("Invalid scene configuration")?;
    let mut scenes = Vec::with_capacity(models.len());
    for (model, store) in models.into_iter().zip(stores) {
        let name = model.name().to_string();
        scenes.push(
            Scene::new(model, store, &kept).with_context(|| format!("Failed to open scene '{}'", name))?,
        );
    }
    Ok(scenes)
}
