//! Rally Netcode - Client-side prediction and reconciliation
//!
//! This crate keeps a player's view of the server-authoritative arena
//! responsive under latency and jitter:
//!
//! - **Input History**: Every player's inputs per frame, pruned to a window
//! - **Delay Estimation**: Input delay recommended from recent RTTs
//! - **Smoothing**: Visual blending toward corrected positions
//! - **Prediction**: The engine tying these together with the snapshot history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PredictionEngine                       │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ InputHistory │  │   Snapshot   │  │  VisualSmoother  │  │
//! │  └──────────────┘  │   History    │  └──────────────────┘  │
//! │  ┌──────────────┐  └──────────────┘  ┌──────────────────┐  │
//! │  │ DelayEstim.  │                    │     GameRng      │  │
//! │  └──────────────┘                    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!        ▲ local input      ▲ server snapshots      │ display state
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rally_netcode::{NetcodeConfig, PredictionEngine};
//!
//! let mut engine = PredictionEngine::new(NetcodeConfig::default());
//! engine.initialize(my_id, first_snapshot)?;
//!
//! // Fixed-step loop
//! loop {
//!     for snapshot in transport.drain_snapshots() {
//!         engine.receive_server_snapshot(snapshot);
//!     }
//!     if let Some(input) = engine.record_local_input(read_controls()) {
//!         transport.send(input);
//!     }
//!     engine.store_prediction(step(engine.last_predicted(), engine.rng_mut()));
//!     engine.tick();
//!
//!     render(&engine.display_state());
//!     hud(&engine.network_stats());
//! }
//! ```

mod clock;
mod config;
mod delay;
mod error;
mod input_history;
mod prediction;
mod simulation;
mod smoothing;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{NetcodeConfig, ReconcileMode};
pub use delay::InputDelayEstimator;
pub use error::{Error, Result};
pub use input_history::InputHistory;
pub use prediction::{EngineState, PredictionEngine};
pub use simulation::Simulation;
pub use smoothing::{Correction, VisualSmoother};
pub use stats::NetworkStats;

// Re-export core types for convenience
pub use rally_core::{Controls, EntityId, Frame, GameRng, PlayerId, PlayerInput, Snapshot, StateHistory};
pub use rally_rollback_buffer::SnapshotHistory;
