//! Per-frame input history for all players
//!
//! Keeps every known input (local and remote) for a trailing window of
//! frames. Used to replay frames during resimulation.

use indexmap::IndexMap;
use rally_core::{Frame, PlayerId, PlayerInput};
use std::collections::BTreeMap;

/// Inputs keyed by frame, then by player
///
/// Frames older than `newest - window` are removed as soon as a newer
/// input arrives, so they can no longer be looked up.
#[derive(Debug)]
pub struct InputHistory {
    frames: BTreeMap<Frame, IndexMap<PlayerId, PlayerInput>>,
    /// Frames kept behind the newest frame
    window: u64,
    newest_frame: Option<Frame>,
}

impl InputHistory {
    /// Create a new history with the given retention window
    pub fn new(window: u64) -> Self {
        Self {
            frames: BTreeMap::new(),
            window,
            newest_frame: None,
        }
    }

    /// Insert or replace the input for `(frame, input.player_id)`
    ///
    /// The stored input's `frame` is set to `frame`. Inputs that are already
    /// older than the window are dropped.
    pub fn add_input(&mut self, frame: Frame, mut input: PlayerInput) {
        let newest = self.newest_frame.map_or(frame, |n| n.max(frame));
        let horizon = newest.saturating_sub(self.window);
        if frame < horizon {
            tracing::trace!(frame, newest, "input older than retention window, dropped");
            return;
        }

        input.frame = frame;
        self.frames
            .entry(frame)
            .or_default()
            .insert(input.player_id, input);
        self.newest_frame = Some(newest);
        self.prune(horizon);
    }

    fn prune(&mut self, horizon: Frame) {
        if self.frames.first_key_value().is_some_and(|(f, _)| *f < horizon) {
            self.frames = self.frames.split_off(&horizon);
            tracing::trace!(horizon, "pruned input history");
        }
    }

    /// Get one player's input for a frame
    pub fn get_player_input(&self, frame: Frame, player_id: PlayerId) -> Option<&PlayerInput> {
        self.frames.get(&frame)?.get(&player_id)
    }

    /// All inputs recorded for a frame, in arrival order
    pub fn frame_inputs(&self, frame: Frame) -> impl Iterator<Item = &PlayerInput> {
        self.frames.get(&frame).into_iter().flat_map(|m| m.values())
    }

    /// Oldest frame with any input
    pub fn oldest_frame(&self) -> Option<Frame> {
        self.frames.keys().next().copied()
    }

    /// Newest frame ever recorded since the last clear
    pub fn newest_frame(&self) -> Option<Frame> {
        self.newest_frame
    }

    /// Total number of stored inputs
    pub fn len(&self) -> usize {
        self.frames.values().map(IndexMap::len).sum()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get the retention window
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Clear all inputs
    pub fn clear(&mut self) {
        self.frames.clear();
        self.newest_frame = None;
    }
}
