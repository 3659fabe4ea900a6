//! Scenes - one configured viewer application each.
//!
//! A scene owns its layouts (selection layouts from config plus the
//! generated scene switcher, transport row and play button), the binding
//! that maps selections to dataset keys, its lock rules, the frames of its
//! datasets and the player showing them.

use crate::assets::{Frame, FrameStore};
use crate::config::{Config, SceneDef};
use crate::core::binding::{AliasMap, DatasetBinding, KeyTemplate, LockRule, LockTable};
use crate::data::geometry::HoverStyle;
use crate::data::input::{InputEvent, PointerState};
use crate::data::layout::{Layout, LayoutSpec, Orientation, SelectionPolicy};
use crate::data::navigation::{Cursor, Navigation};
use crate::data::player::{Direction, FramePlayer};
use crate::error::{ViewerError, ViewerResult};
use std::time::Instant;

pub const SCENES_LAYOUT: &str = "scenes";
pub const TRANSPORT_LAYOUT: &str = "transport";
pub const PLAY_LAYOUT: &str = "play";
pub const PREVIOUS_LABEL: &str = "<";
pub const NEXT_LABEL: &str = ">";
pub const PLAY_LABEL: &str = "Play";
pub const STOP_LABEL: &str = "Stop";

/// What a layout is for; decides how the session reacts when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutRole {
    Scenes,
    Selection,
    Transport,
    Play,
}

/// Layouts, binding and lock rules of a scene, without any frames.
#[derive(Debug, Clone)]
pub struct SceneModel {
    name: String,
    layouts: Vec<Layout>,
    roles: Vec<LayoutRole>,
    captions: Vec<Option<String>>,
    binding: DatasetBinding,
    summary: Option<DatasetBinding>,
    locks: LockTable,
}

impl SceneModel {
    /// Build scene `index` of `scene_names` from its definition. The scene
    /// switcher row is only generated when there is more than one scene.
    pub fn build(
        def: &SceneDef,
        index: usize,
        scene_names: &[String],
        config: &Config,
    ) -> ViewerResult<Self> {
        let hover = config.ui.hover_style();
        let center_x = i32::from(config.ui.panel_width) / 2;

        let mut layouts = Vec::new();
        let mut roles = Vec::new();
        let mut captions = Vec::new();

        if scene_names.len() > 1 {
            let width = scene_names
                .iter()
                .map(|n| n.chars().count() as i32)
                .max()
                .unwrap_or(0)
                + 4;
            layouts.push(Layout::new(
                LayoutSpec::new(SCENES_LAYOUT, scene_names.iter().cloned())
                    .active([index])
                    .at(center_x, 1)
                    .size(width, 3)
                    .distance(width + 2)
                    .hover(hover),
            )?);
            roles.push(LayoutRole::Scenes);
            captions.push(None);
        }

        let mut aliases = AliasMap::new();
        for layout_def in &def.layouts {
            if [SCENES_LAYOUT, TRANSPORT_LAYOUT, PLAY_LAYOUT].contains(&layout_def.name.as_str()) {
                return Err(ViewerError::invalid(format!(
                    "scene '{}': layout name '{}' is reserved",
                    def.name, layout_def.name
                )));
            }
            if layouts.iter().any(|l| l.name() == layout_def.name) {
                return Err(ViewerError::invalid(format!(
                    "scene '{}': duplicate layout '{}'",
                    def.name, layout_def.name
                )));
            }
            layouts.push(Layout::new(layout_def.to_spec(hover)?)?);
            roles.push(LayoutRole::Selection);
            captions.push(layout_def.caption.clone());
            if !layout_def.aliases.is_empty() {
                aliases.insert(layout_def.name.clone(), layout_def.aliases.clone());
            }
        }
        if !roles.contains(&LayoutRole::Selection) {
            return Err(ViewerError::invalid(format!(
                "scene '{}' has no layouts",
                def.name
            )));
        }

        // Transport row and play button sit under everything else
        let bottom = layouts
            .iter()
            .map(|l| l.bounds().bottom())
            .max()
            .unwrap_or(0);
        let row_y = bottom + 2;
        layouts.push(Layout::new(
            LayoutSpec::new(TRANSPORT_LAYOUT, [PREVIOUS_LABEL, NEXT_LABEL])
                .active([0, 1])
                .policy(SelectionPolicy::Momentary)
                .at(center_x - 5, row_y)
                .size(5, 3)
                .distance(6)
                .hover(hover),
        )?);
        roles.push(LayoutRole::Transport);
        captions.push(None);
        layouts.push(Layout::new(
            LayoutSpec::new(PLAY_LAYOUT, [PLAY_LABEL])
                .active([0])
                .policy(SelectionPolicy::Momentary)
                .orientation(Orientation::Horizontal)
                .at(center_x + 6, row_y)
                .size(8, 3)
                .hover(hover),
        )?);
        roles.push(LayoutRole::Play);
        captions.push(None);

        let binding = DatasetBinding::new(KeyTemplate::parse(&def.key_template)?, aliases);
        binding.validate(&layouts)?;

        let summary = match &def.summary {
            Some(text) => {
                let summary = DatasetBinding::new(KeyTemplate::parse(text)?, AliasMap::new());
                summary.validate(&layouts)?;
                Some(summary)
            }
            None => None,
        };

        let locks = LockTable::new(
            def.lock_rules
                .iter()
                .map(|rule| LockRule {
                    valid_when: rule
                        .valid_when
                        .iter()
                        .map(|(layout, label)| (layout.clone(), label.clone()))
                        .collect(),
                    target: rule.target.clone(),
                    forced: rule
                        .forced
                        .iter()
                        .map(|(member, active)| (member.clone(), *active))
                        .collect(),
                })
                .collect(),
        );
        locks.validate(&layouts)?;

        Ok(Self {
            name: def.name.clone(),
            layouts,
            roles,
            captions,
            binding,
            summary,
            locks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn role(&self, index: usize) -> Option<LayoutRole> {
        self.roles.get(index).copied()
    }

    pub fn caption(&self, index: usize) -> Option<&str> {
        self.captions.get(index).and_then(|c| c.as_deref())
    }

    /// Enforce lock rules, then build the key for the resulting selections.
    pub fn resolve_key(&mut self) -> ViewerResult<String> {
        self.locks.apply(&mut self.layouts)?;
        self.binding.dataset_key(&self.layouts)
    }

    /// Summary line for the current selections, if the scene has one
    pub fn summary(&self) -> Option<String> {
        self.summary
            .as_ref()
            .and_then(|s| s.dataset_key(&self.layouts).ok())
    }

    /// Active flags and lock state of every selection layout
    fn selections(&self) -> Selections {
        self.layouts
            .iter()
            .zip(&self.roles)
            .enumerate()
            .filter(|(_, (_, role))| **role == LayoutRole::Selection)
            .map(|(index, (layout, _))| SelectionState {
                index,
                active: layout.widgets().iter().map(|w| w.is_active()).collect(),
                locked: layout.is_locked(),
            })
            .collect()
    }

    fn restore_selections(&mut self, selections: &[SelectionState]) {
        for state in selections {
            let Some(layout) = self.layouts.get_mut(state.index) else {
                continue;
            };
            for (i, active) in state.active.iter().enumerate() {
                if let Ok(widget) = layout.by_index_mut(i) {
                    widget.set_active(*active);
                }
            }
            if state.locked {
                layout.lock();
            } else {
                layout.unlock();
            }
        }
    }

    fn layout_mut(&mut self, role: LayoutRole) -> Option<&mut Layout> {
        let index = self.roles.iter().position(|r| *r == role)?;
        self.layouts.get_mut(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionState {
    index: usize,
    active: Vec<bool>,
    locked: bool,
}

type Selections = Vec<SelectionState>;

#[derive(Debug, Clone)]
pub struct Scene {
    model: SceneModel,
    navigation: Navigation,
    store: FrameStore,
    player: FramePlayer<Frame>,
    /// Selections the player's dataset was built from
    bound: Selections,
}

impl Scene {
    /// Bind the model to its frames. The initial selection must resolve to a
    /// dataset present in `store`.
    pub fn new(mut model: SceneModel, store: FrameStore, config: &Config) -> ViewerResult<Self> {
        let navigation = Navigation::with_layout_chaining(&mut model.layouts)?;
        let key = model.resolve_key()?;
        let frames = store.get(&key)?;
        let player = FramePlayer::new(
            key,
            frames,
            config.player.play_interval(),
            config.player.on_dataset_swap,
        )?;
        let bound = model.selections();
        Ok(Self {
            model,
            navigation,
            store,
            player,
            bound,
        })
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn layouts(&self) -> &[Layout] {
        self.model.layouts()
    }

    pub fn player(&self) -> &FramePlayer<Frame> {
        &self.player
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn cursor(&self) -> Cursor {
        self.navigation.cursor()
    }

    /// Route one event through navigation and then the layouts. The first
    /// layout that reports an activation wins; returns its index and role.
    pub fn update_layouts(
        &mut self,
        event: &InputEvent,
        pointer: &PointerState,
    ) -> Option<(usize, LayoutRole)> {
        self.navigation.update(event, &mut self.model.layouts);
        let index = self
            .model
            .layouts
            .iter_mut()
            .position(|layout| layout.update(event, pointer))?;
        Some((index, self.model.roles[index]))
    }

    /// Re-run lock rules and the binding; swap datasets when the key
    /// changed. On failure the current dataset stays and the selection
    /// layouts roll back to the selections it was bound from.
    pub fn rebind(&mut self) -> ViewerResult<bool> {
        match self.bind_selection() {
            Ok(swapped) => {
                self.bound = self.model.selections();
                Ok(swapped)
            }
            Err(e) => {
                tracing::debug!(scene = %self.model.name, "restoring bound selections");
                self.model.restore_selections(&self.bound);
                Err(e)
            }
        }
    }

    fn bind_selection(&mut self) -> ViewerResult<bool> {
        let key = self.model.resolve_key()?;
        if key == self.player.key() {
            return Ok(false);
        }
        let frames = self.store.get(&key)?;
        self.player.swap(key, frames)?;
        Ok(true)
    }

    /// Manual step: stops autoplay first
    pub fn step(&mut self, direction: Direction) -> usize {
        self.player.stop();
        let index = self.player.step(direction);
        self.sync_play_label();
        index
    }

    pub fn toggle_play(&mut self, now: Instant) -> bool {
        let playing = self.player.toggle_play(now);
        self.sync_play_label();
        playing
    }

    pub fn stop(&mut self) {
        self.player.stop();
        self.sync_play_label();
    }

    pub fn seek(&mut self, index: usize) -> usize {
        self.player.stop();
        self.sync_play_label();
        self.player.seek(index)
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.player.tick(now)
    }

    /// Direction of a fired transport button
    pub fn transport_direction(&self, index: usize) -> Option<Direction> {
        let (_, widget) = self.model.layouts.get(index)?.fired()?;
        match widget.label() {
            PREVIOUS_LABEL => Some(Direction::Previous),
            NEXT_LABEL => Some(Direction::Next),
            _ => None,
        }
    }

    /// Index of the scene picked in the switcher, if it just fired
    pub fn picked_scene(&self, index: usize) -> Option<usize> {
        self.model.layouts.get(index)?.fired().map(|(i, _)| i)
    }

    /// Point the switcher at `index`
    pub fn mark_scene(&mut self, index: usize) {
        if let Some(switcher) = self.model.layout_mut(LayoutRole::Scenes) {
            switcher.deactivate_all();
            if let Ok(widget) = switcher.by_index_mut(index) {
                widget.set_active(true);
            }
        }
    }

    pub fn summary(&self) -> Option<String> {
        self.model.summary()
    }

    fn sync_play_label(&mut self) {
        let label = if self.player.is_playing() {
            STOP_LABEL
        } else {
            PLAY_LABEL
        };
        if let Some(play) = self.model.layout_mut(LayoutRole::Play) {
            if let Ok(button) = play.by_index_mut(0) {
                button.set_label(label);
            }
        }
    }
}

/// Build every scene's model without touching the disk. Used to check a
/// configuration before running it.
pub fn build_models(config: &Config) -> ViewerResult<Vec<SceneModel>> {
    if config.scenes.is_empty() {
        return Err(ViewerError::invalid("no scenes configured"));
    }
    let names = scene_names(config);
    for (i, name) in names.iter().enumerate() {
        if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return Err(ViewerError::invalid(format!("duplicate scene '{}'", name)));
        }
    }
    config
        .scenes
        .iter()
        .enumerate()
        .map(|(i, def)| {
            SceneModel::build(def, i, &names, config).map_err(|e| match e {
                ViewerError::InvalidConfiguration(msg) if !msg.starts_with("scene ") => {
                    ViewerError::invalid(format!("scene '{}': {}", def.name, msg))
                }
                other => other,
            })
        })
        .collect()
}

pub fn scene_names(config: &Config) -> Vec<String> {
    config.scenes.iter().map(|s| s.name.clone()).collect()
}
