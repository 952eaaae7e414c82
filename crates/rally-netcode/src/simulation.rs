//! Deterministic step function seam
//!
//! The game rules (paddle and ball motion, scoring, power-ups) live outside
//! this crate. The prediction engine only needs them when it re-simulates
//! frames after a divergence.

use rally_core::{GameRng, PlayerInput, Snapshot};

/// A deterministic, fixed-timestep game simulation
///
/// `step` must be a pure function of `(state, inputs, rng)`: the same
/// arguments must produce a bit-identical snapshot on every peer. All
/// randomness must be drawn from `rng`.
pub trait Simulation {
    /// Produce the state one frame after `state`
    ///
    /// `inputs` holds every known input for the new frame. Players without
    /// an input are expected to repeat their last known controls.
    fn step(&mut self, state: &Snapshot, inputs: &[PlayerInput], rng: &mut GameRng) -> Snapshot;
}

impl<F> Simulation for F
where
    F: FnMut(&Snapshot, &[PlayerInput], &mut GameRng) -> Snapshot,
{
    fn step(&mut self, state: &Snapshot, inputs: &[PlayerInput], rng: &mut GameRng) -> Snapshot {
        self(state, inputs, rng)
    }
}
