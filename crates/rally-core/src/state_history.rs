//! State history trait for storing and retrieving frame-indexed snapshots
//!
//! This trait is used by:
//! - `rally-netcode` for divergence checks and resimulation
//! - `rally-rollback-buffer` for the bounded ring buffer implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use rally_core::{Frame, Snapshot, StateHistory};
//!
//! struct MyHistory {
//!     snapshots: Vec<Snapshot>,
//! }
//!
//! impl StateHistory for MyHistory {
//!     fn push(&mut self, snapshot: Snapshot) -> bool {
//!         self.snapshots.push(snapshot);
//!         true
//!     }
//!
//!     fn get(&self, frame: Frame) -> Option<&Snapshot> {
//!         self.snapshots.iter().find(|s| s.frame == frame)
//!     }
//!
//!     // ... other methods
//! }
//! ```

use crate::{Frame, Snapshot};

/// Trait for storing and retrieving snapshots by frame.
///
/// Implementations own the snapshots pushed into them. At most one live
/// snapshot exists per frame; pushing the same frame again replaces it.
pub trait StateHistory {
    /// Store a snapshot at its frame.
    ///
    /// Returns `false` if the implementation refused it (e.g. older than the
    /// retained window). Refusal is not an error.
    fn push(&mut self, snapshot: Snapshot) -> bool;

    /// Get the snapshot at exactly the given frame, if it is still live.
    fn get(&self, frame: Frame) -> Option<&Snapshot>;

    /// Get the snapshot at the newest frame.
    fn latest(&self) -> Option<&Snapshot>;

    /// Oldest and newest live frames, `None` when empty.
    fn frame_range(&self) -> Option<(Frame, Frame)>;

    /// Drop every snapshot.
    fn clear(&mut self);

    /// Maximum number of snapshots retained, if bounded.
    fn capacity(&self) -> Option<usize>;

    /// Number of live snapshots.
    fn len(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest live frame.
    fn oldest_frame(&self) -> Option<Frame> {
        self.frame_range().map(|(oldest, _)| oldest)
    }

    /// Newest live frame.
    fn newest_frame(&self) -> Option<Frame> {
        self.frame_range().map(|(_, newest)| newest)
    }
}
