//! Configuration loader plus strongly typed settings structures.
//!
//! The shipped `defaults/config.toml` is embedded at compile time and
//! extracted into the base directory (`~/.seqview` unless overridden) on
//! first run. Users edit the extracted copy; scenes, layouts and lock rules
//! are all data.

use crate::data::geometry::HoverStyle;
use crate::data::layout::{LayoutSpec, Orientation, SelectionPolicy};
use crate::data::player::SwapPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Embed default configuration at compile time
const DEFAULT_CONFIG: &str = include_str!("../defaults/config.toml");

/// Environment variable overriding the base directory
pub const DIR_ENV: &str = "SEQVIEW_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
    /// Directory relative dataset paths are resolved against; set at runtime
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Upper bound on how long one loop iteration waits for input
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Width of the control panel column, in cells
    #[serde(default = "default_panel_width")]
    pub panel_width: u16,
    /// Pop/grow widgets under the pointer or focus
    #[serde(default = "default_true")]
    pub hover_effects: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_play_interval_ms")]
    pub play_interval_ms: u64,
    #[serde(default)]
    pub on_dataset_swap: SwapPolicy,
    /// Start playing as soon as the viewer opens
    #[serde(default)]
    pub autoplay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory inside each dataset folder that holds the frames
    #[serde(default = "default_frames_subdir")]
    pub frames_subdir: String,
    /// Frames wider than this are downscaled while loading
    #[serde(default = "default_max_frame_width")]
    pub max_frame_width: u32,
}

/// Widget colors as hex strings (`#RRGGBB`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_active_current_color")]
    pub active_current: String,
    #[serde(default = "default_current_color")]
    pub current: String,
    #[serde(default = "default_active_color")]
    pub active: String,
    #[serde(default = "default_inactive_color")]
    pub inactive: String,
    #[serde(default = "default_text_color")]
    pub text: String,
    #[serde(default = "default_shadow_color")]
    pub shadow: String,
    #[serde(default = "default_locked_color")]
    pub locked: String,
    #[serde(default = "default_background_color")]
    pub background: String,
}

/// One viewer application: its layouts, key template and lock rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDef {
    pub name: String,
    /// Directory holding one folder per dataset key
    pub dataset_dir: String,
    /// Overrides `assets.frames_subdir` for this scene
    #[serde(default)]
    pub frames_subdir: Option<String>,
    pub key_template: String,
    /// Status text built like a key template, e.g. "Total number of samples: {coarse+fine}"
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub layouts: Vec<LayoutDef>,
    #[serde(default)]
    pub lock_rules: Vec<LockRuleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDef {
    pub name: String,
    /// Text drawn left of the layout
    #[serde(default)]
    pub caption: Option<String>,
    pub labels: Vec<String>,
    #[serde(default)]
    pub active: Vec<usize>,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default = "default_policy")]
    pub policy: String,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_widget_width")]
    pub width: i32,
    #[serde(default = "default_widget_height")]
    pub height: i32,
    #[serde(default = "default_distance")]
    pub distance: i32,
    #[serde(default = "default_true")]
    pub center: bool,
    /// Label -> text used in dataset keys
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRuleDef {
    pub target: String,
    /// Layout -> label that must be active for `target` to be free
    #[serde(default)]
    pub valid_when: BTreeMap<String, String>,
    /// Member -> active flag enforced while locked
    #[serde(default)]
    pub forced: BTreeMap<String, bool>,
}

fn default_true() -> bool {
    true
}

fn default_poll_timeout_ms() -> u64 {
    16
}

fn default_panel_width() -> u16 {
    44
}

fn default_play_interval_ms() -> u64 {
    70
}

fn default_frames_subdir() -> String {
    "video_200000".to_string()
}

fn default_max_frame_width() -> u32 {
    160
}

fn default_active_current_color() -> String {
    "#90EE90".to_string()
}

fn default_current_color() -> String {
    "#00C000".to_string()
}

fn default_active_color() -> String {
    "#FFFFFF".to_string()
}

fn default_inactive_color() -> String {
    "#808080".to_string()
}

fn default_text_color() -> String {
    "#000000".to_string()
}

fn default_shadow_color() -> String {
    "#202020".to_string()
}

fn default_locked_color() -> String {
    "#C08000".to_string()
}

fn default_background_color() -> String {
    "#303040".to_string()
}

fn default_orientation() -> String {
    "horizontal".to_string()
}

fn default_policy() -> String {
    "exclusive".to_string()
}

fn default_widget_width() -> i32 {
    6
}

fn default_widget_height() -> i32 {
    3
}

fn default_distance() -> i32 {
    8
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            panel_width: default_panel_width(),
            hover_effects: true,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            play_interval_ms: default_play_interval_ms(),
            on_dataset_swap: SwapPolicy::default(),
            autoplay: false,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            frames_subdir: default_frames_subdir(),
            max_frame_width: default_max_frame_width(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            active_current: default_active_current_color(),
            current: default_current_color(),
            active: default_active_color(),
            inactive: default_inactive_color(),
            text: default_text_color(),
            shadow: default_shadow_color(),
            locked: default_locked_color(),
            background: default_background_color(),
        }
    }
}

impl UiConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms.max(1))
    }

    pub fn hover_style(&self) -> HoverStyle {
        if self.hover_effects {
            HoverStyle::default()
        } else {
            HoverStyle::flat()
        }
    }
}

impl PlayerConfig {
    pub fn play_interval(&self) -> Duration {
        Duration::from_millis(self.play_interval_ms.max(1))
    }
}

impl LayoutDef {
    /// Translate into a layout spec; orientation and policy strings are
    /// checked here.
    pub fn to_spec(&self, hover: HoverStyle) -> crate::error::ViewerResult<LayoutSpec> {
        let orientation: Orientation = self.orientation.parse()?;
        let policy: SelectionPolicy = self.policy.parse()?;
        Ok(LayoutSpec::new(self.name.clone(), self.labels.iter().cloned())
            .active(self.active.iter().copied())
            .at(self.x, self.y)
            .size(self.width, self.height)
            .distance(self.distance)
            .centered(self.center)
            .orientation(orientation)
            .policy(policy)
            .hover(hover))
    }
}

impl Config {
    /// Parse a config document. `base_dir` is left empty.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    /// The embedded default configuration
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Load config with command-line options
    ///
    /// `config_file` wins when given; otherwise `<base>/config.toml` is used,
    /// extracting the embedded default there first if missing.
    pub fn load_with_options(config_file: Option<&Path>, dir_override: Option<&Path>) -> Result<Self> {
        let base = Self::base_dir(dir_override)?;
        let path = match config_file {
            Some(path) => path.to_path_buf(),
            None => {
                Self::extract_defaults(&base)?;
                Self::config_path(&base)
            }
        };
        Self::load_from_path(&path)
    }

    /// Load config from a custom file path. Relative dataset directories
    /// resolve against the file's own directory.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
        let mut config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {:?}", path))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!("Loaded config from {:?} ({} scenes)", path, config.scenes.len());
        Ok(config)
    }

    /// Extract default files on first run. Idempotent: only creates
    /// missing files.
    pub fn extract_defaults(base: &Path) -> Result<()> {
        fs::create_dir_all(base)
            .context(format!("Failed to create base directory: {:?}", base))?;
        let config_path = Self::config_path(base);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG).context("Failed to write config.toml")?;
            tracing::info!("Extracted config.toml to {:?}", config_path);
        }
        Ok(())
    }

    /// Get the base seqview directory (~/.seqview/)
    /// An explicit override wins, then the SEQVIEW_DIR environment variable
    pub fn base_dir(dir_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = dir_override {
            return Ok(dir.to_path_buf());
        }
        if let Ok(custom_dir) = std::env::var(DIR_ENV) {
            return Ok(PathBuf::from(custom_dir));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".seqview"))
    }

    pub fn config_path(base: &Path) -> PathBuf {
        base.join("config.toml")
    }

    /// Scene by name, case-insensitive
    pub fn scene(&self, name: &str) -> Option<&SceneDef> {
        self.scenes
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Dataset directory of a scene, resolved against the base directory
    pub fn dataset_dir(&self, scene: &SceneDef) -> PathBuf {
        let dir = Path::new(&scene.dataset_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.base_dir.join(dir)
        }
    }

    pub fn frames_subdir<'a>(&'a self, scene: &'a SceneDef) -> &'a str {
        scene
            .frames_subdir
            .as_deref()
            .unwrap_or(&self.assets.frames_subdir)
    }
}
