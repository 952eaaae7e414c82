//! Rally Core - Shared simulation data for rollback netcode
//!
//! This crate provides the types both the authoritative server and the
//! predicting client agree on:
//! - Frame and player identifiers
//! - Deterministic RNG with importable/exportable state
//! - `Snapshot` - full simulation state at one frame, with checksum
//! - `PlayerInput` - one player's controls for one frame
//! - `StateHistory` - storage trait for frame-indexed snapshots
//!
//! ## Determinism
//!
//! Every value that feeds the checksum or the RNG is an `f32` or an integer.
//! Checksums hash `f32` bit patterns, so two peers that computed the same
//! state produce the same checksum on any platform.

mod decode;
mod error;
mod input;
mod rng;
mod snapshot;
mod state_history;
pub mod time;

pub use decode::decode_snapshot;
pub use error::{Error, Result};
pub use input::{Controls, PlayerInput};
pub use rng::GameRng;
pub use snapshot::{Ball, EntityId, PlayerState, Powerup, PowerupKind, Snapshot};
pub use state_history::StateHistory;
pub use time::{Frame, PlayerId};
