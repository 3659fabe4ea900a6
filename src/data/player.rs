//! Frame player - the active frame sequence, the shown index and autoplay.
//!
//! Autoplay never sleeps. The host asks [`FramePlayer::time_until_tick`] how
//! long it may block waiting for input and calls [`FramePlayer::tick`] once
//! per loop iteration.

use crate::error::{ViewerError, ViewerResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// What happens to the shown index when a different sequence is swapped in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapPolicy {
    /// Start the new sequence from its first frame
    #[default]
    Reset,
    /// Keep the index, clamped to the new sequence length
    Preserve,
}

pub fn next_index(index: usize, max_index: usize) -> usize {
    if index >= max_index {
        0
    } else {
        index + 1
    }
}

pub fn previous_index(index: usize, max_index: usize) -> usize {
    if index == 0 {
        max_index
    } else {
        index - 1
    }
}

#[derive(Debug, Clone)]
pub struct FramePlayer<F> {
    key: String,
    frames: Arc<Vec<F>>,
    index: usize,
    playing: bool,
    interval: Duration,
    policy: SwapPolicy,
    next_tick: Option<Instant>,
}

impl<F> FramePlayer<F> {
    pub fn new(
        key: impl Into<String>,
        frames: Arc<Vec<F>>,
        interval: Duration,
        policy: SwapPolicy,
    ) -> ViewerResult<Self> {
        let key = key.into();
        if frames.is_empty() {
            return Err(ViewerError::invalid(format!(
                "dataset '{}' has no frames",
                key
            )));
        }
        Ok(Self {
            key,
            frames,
            index: 0,
            playing: false,
            interval,
            policy,
            next_tick: None,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn max_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_frame(&self) -> &F {
        &self.frames[self.index]
    }

    pub fn step(&mut self, direction: Direction) -> usize {
        self.index = match direction {
            Direction::Next => next_index(self.index, self.max_index()),
            Direction::Previous => previous_index(self.index, self.max_index()),
        };
        self.index
    }

    /// Flip autoplay; the first automatic step happens one interval from `now`.
    pub fn toggle_play(&mut self, now: Instant) -> bool {
        if self.playing {
            self.stop();
        } else {
            self.playing = true;
            self.next_tick = Some(now + self.interval);
        }
        self.playing
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.next_tick = None;
    }

    /// Show `index`, clamped to the sequence
    pub fn seek(&mut self, index: usize) -> usize {
        self.index = index.min(self.max_index());
        self.index
    }

    /// Replace the sequence wholesale. Play state is kept.
    pub fn swap(&mut self, key: impl Into<String>, frames: Arc<Vec<F>>) -> ViewerResult<()> {
        let key = key.into();
        if frames.is_empty() {
            return Err(ViewerError::invalid(format!(
                "dataset '{}' has no frames",
                key
            )));
        }
        self.frames = frames;
        self.index = match self.policy {
            SwapPolicy::Reset => 0,
            SwapPolicy::Preserve => self.index.min(self.frames.len() - 1),
        };
        tracing::info!(dataset = %key, frames = self.frames.len(), index = self.index, "dataset swapped");
        self.key = key;
        Ok(())
    }

    /// Advance one frame if playing and the interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(due) if self.playing && now >= due => {
                self.step(Direction::Next);
                self.next_tick = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// How long until the next automatic step; `None` while paused.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick
            .filter(|_| self.playing)
            .map(|due| due.saturating_duration_since(now))
    }
}
