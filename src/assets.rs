//! Frame assets - decoding image sequences from disk into memory.
//!
//! A dataset is a directory `<root>/<key>/<frames_subdir>/` holding one
//! image per frame; frames play in file-name order. Everything is decoded
//! up front by [`FrameStore::preload`] so swapping datasets never touches
//! the disk.

use crate::error::{ViewerError, ViewerResult};
use anyhow::Context;
use image::imageops::FilterType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Decoded frame, row-major RGB8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Arc<Vec<u8>>,
}

impl Frame {
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> ViewerResult<Self> {
        if rgb.len() != (width as usize) * (height as usize) * 3 {
            return Err(ViewerError::invalid(format!(
                "frame buffer of {} bytes does not match {}x{}",
                rgb.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            rgb: Arc::new(rgb),
        })
    }

    /// Pixel at (x, y); caller keeps coordinates in range
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }
}

/// Decode one encoded image, downscaling to at most `max_width` columns.
pub fn decode_frame(bytes: &[u8], max_width: Option<u32>) -> ViewerResult<Frame> {
    let mut img = image::load_from_memory(bytes).context("decode frame from memory")?;
    if let Some(max_width) = max_width.filter(|&w| w > 0 && img.width() > w) {
        img = img.resize(max_width, u32::MAX, FilterType::Triangle);
    }
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame {
        width,
        height,
        rgb: Arc::new(rgb.into_raw()),
    })
}

/// Where frame sequences come from
pub trait FrameSource {
    /// Keys of every dataset this source can load, sorted
    fn dataset_keys(&self) -> ViewerResult<Vec<String>>;

    /// Frames of one dataset in playback order
    fn load_frame_sequence(&self, key: &str) -> ViewerResult<Vec<Frame>>;
}

#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    root: PathBuf,
    frames_subdir: String,
    max_width: Option<u32>,
}

impl DirectoryFrameSource {
    pub fn new(root: impl Into<PathBuf>, frames_subdir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            frames_subdir: frames_subdir.into(),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn frames_dir(&self, key: &str) -> PathBuf {
        let dir = self.root.join(key);
        if self.frames_subdir.is_empty() {
            dir
        } else {
            dir.join(&self.frames_subdir)
        }
    }

    fn frame_paths(&self, key: &str) -> ViewerResult<Vec<PathBuf>> {
        let dir = self.frames_dir(key);
        if !dir.is_dir() {
            return Err(ViewerError::not_found("dataset", key));
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("read frames directory {}", dir.display()))?
        {
            let path = entry
                .with_context(|| format!("read entry in {}", dir.display()))?
                .path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_frame && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl FrameSource for DirectoryFrameSource {
    fn dataset_keys(&self) -> ViewerResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(ViewerError::not_found(
                "dataset directory",
                self.root.display().to_string(),
            ));
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("read dataset directory {}", self.root.display()))?
        {
            let entry = entry.with_context(|| format!("read entry in {}", self.root.display()))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.frames_dir(&name).is_dir() {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn load_frame_sequence(&self, key: &str) -> ViewerResult<Vec<Frame>> {
        let paths = self.frame_paths(key)?;
        if paths.is_empty() {
            return Err(ViewerError::invalid(format!("dataset '{}' has no frames", key)));
        }
        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes =
                std::fs::read(path).with_context(|| format!("read frame {}", path.display()))?;
            let frame = decode_frame(&bytes, self.max_width).map_err(|e| match e {
                ViewerError::Other(err) => {
                    ViewerError::Other(err.context(format!("frame {}", path.display())))
                }
                other => other,
            })?;
            frames.push(frame);
        }
        tracing::debug!(dataset = key, frames = frames.len(), "loaded frame sequence");
        Ok(frames)
    }
}

/// In-memory frame sequences keyed by dataset key
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    sequences: HashMap<String, Arc<Vec<Frame>>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every dataset `source` offers. Datasets that fail to load are
    /// logged and skipped; returns how many were loaded.
    pub fn preload(&mut self, source: &dyn FrameSource) -> ViewerResult<usize> {
        let mut loaded = 0;
        for key in source.dataset_keys()? {
            match source.load_frame_sequence(&key) {
                Ok(frames) => {
                    self.insert(key, frames);
                    loaded += 1;
                }
                Err(e) => tracing::warn!(dataset = %key, "skipping dataset: {}", e),
            }
        }
        tracing::info!(loaded, "preloaded datasets");
        Ok(loaded)
    }

    pub fn insert(&mut self, key: impl Into<String>, frames: Vec<Frame>) {
        self.sequences.insert(key.into(), Arc::new(frames));
    }

    pub fn get(&self, key: &str) -> ViewerResult<Arc<Vec<Frame>>> {
        self.sequences
            .get(key)
            .cloned()
            .ok_or_else(|| ViewerError::not_found("dataset", key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sequences.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Sorted dataset keys
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.sequences.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
