//! Rally Rollback Buffer - Ring buffer for real-time snapshot history
//!
//! This crate provides a bounded, frame-indexed snapshot store for the
//! prediction engine.
//!
//! # Features
//!
//! - **Bounded memory**: Fixed-size ring buffer, no unbounded growth
//! - **O(1) insertion and lookup**: Slot is `frame % capacity`
//! - **Out-of-order tolerant**: Keyed by frame, not insertion order
//! - **Automatic eviction**: Frames older than `newest - capacity + 1` are unreachable
//!
//! # Example
//!
//! ```rust
//! use rally_core::{Snapshot, StateHistory};
//! use rally_rollback_buffer::SnapshotHistory;
//!
//! let mut history = SnapshotHistory::new(8);
//! for frame in 0..8 {
//!     history.push(Snapshot::new(frame));
//! }
//! assert!(history.get(3).is_some());
//!
//! // Frame 8 lands in frame 0's slot
//! history.push(Snapshot::new(8));
//! assert!(history.get(0).is_none());
//! assert_eq!(history.get(8).map(|s| s.frame), Some(8));
//! ```

use rally_core::{Frame, Snapshot, StateHistory};

/// A ring buffer of recent snapshots keyed by frame
///
/// Slot `frame % capacity` holds the most recent snapshot pushed for any
/// frame mapping to it. A lookup only succeeds when the frame lies in the
/// live window and the slot still holds that exact frame.
#[derive(Debug)]
pub struct SnapshotHistory {
    slots: Vec<Option<Snapshot>>,
    capacity: usize,
    /// Live window (oldest, newest), None when empty
    range: Option<(Frame, Frame)>,
}

impl SnapshotHistory {
    /// Create a new history with the given capacity
    ///
    /// A capacity of zero is treated as one.
    ///
    /// ```rust
    /// use rally_rollback_buffer::SnapshotHistory;
    ///
    /// // 128 frames at 60fps = ~2 seconds of history
    /// let history = SnapshotHistory::new(128);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            range: None,
        }
    }

    fn slot(&self, frame: Frame) -> usize {
        (frame % self.capacity as u64) as usize
    }

    /// Lowest frame a window ending at `newest` can hold
    fn window_start(&self, newest: Frame) -> Frame {
        newest.saturating_sub(self.capacity as u64 - 1)
    }

    /// Live snapshots, oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        let (oldest, newest) = self.range.unwrap_or((1, 0));
        (oldest..=newest).filter_map(move |frame| self.get(frame))
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        let (oldest, newest) = self.range.unwrap_or((0, 0));
        BufferStats {
            capacity: self.capacity,
            count: self.len(),
            oldest_frame: oldest,
            newest_frame: newest,
        }
    }
}

impl StateHistory for SnapshotHistory {
    fn push(&mut self, snapshot: Snapshot) -> bool {
        let frame = snapshot.frame;

        let range = match self.range {
            None => (frame, frame),
            Some((oldest, newest)) => {
                if frame < self.window_start(newest) {
                    tracing::trace!(frame, newest, "snapshot older than history window, dropped");
                    return false;
                }
                let newest = newest.max(frame);
                let oldest = oldest.min(frame).max(self.window_start(newest));
                (oldest, newest)
            }
        };

        let index = self.slot(frame);
        self.slots[index] = Some(snapshot);
        self.range = Some(range);
        true
    }

    fn get(&self, frame: Frame) -> Option<&Snapshot> {
        let (oldest, newest) = self.range?;
        if frame < oldest || frame > newest {
            return None;
        }
        self.slots[self.slot(frame)]
            .as_ref()
            .filter(|s| s.frame == frame)
    }

    fn latest(&self) -> Option<&Snapshot> {
        let (_, newest) = self.range?;
        self.get(newest)
    }

    fn frame_range(&self) -> Option<(Frame, Frame)> {
        self.range
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.range = None;
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn len(&self) -> usize {
        match self.range {
            None => 0,
            Some((oldest, newest)) => self
                .slots
                .iter()
                .flatten()
                .filter(|s| s.frame >= oldest && s.frame <= newest)
                .count(),
        }
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60fps
    }
}

/// Statistics about the snapshot history
#[derive(Debug, Clone, Copy)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of live snapshots
    pub count: usize,
    /// Oldest frame in the window
    pub oldest_frame: Frame,
    /// Newest frame in the window
    pub newest_frame: Frame,
}

impl BufferStats {
    /// Frames covered by the window (newest - oldest)
    pub fn span(&self) -> Frame {
        if self.count == 0 {
            0
        } else {
            self.newest_frame - self.oldest_frame
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
