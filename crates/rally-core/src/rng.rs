//! Deterministic random number generator
//!
//! A 32-bit xorshift recurrence with a murmur-style output finalizer.
//! The full state fits in one `u32`, so the server can ship it inside every
//! snapshot and clients can resynchronize to it exactly.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Largest `f32` strictly below `TAU`
const TAU_BELOW: f32 = 6.283_185;

/// A deterministic random number generator
///
/// Two generators holding the same state produce the same raw and derived
/// sequences. Derived helpers only use `f32` arithmetic so results match
/// bit-for-bit across peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    state: u32,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            state: non_zero(seed),
        }
    }

    /// Re-seed in place
    pub fn seed(&mut self, seed: u32) {
        self.state = non_zero(seed);
    }

    /// Current internal state, for shipping to another peer
    pub fn export_state(&self) -> u32 {
        self.state
    }

    /// Resume from an exported state
    pub fn import_state(&mut self, state: u32) {
        self.state = non_zero(state);
    }

    /// Advance and return the next raw value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        avalanche(x)
    }

    /// Uniform `f32` in `[0, 1)`
    ///
    /// Uses the top 24 bits so every result is exactly representable.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform `f32` in `[min, max)`
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform integer in the closed range `[min, max]`
    ///
    /// The bounds may be given in either order.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let span = (i64::from(hi) - i64::from(lo) + 1) as u64;
        let offset = u64::from(self.next_u32()) % span;
        (i64::from(lo) + offset as i64) as i32
    }

    /// Uniform angle in radians in `[0, 2π)`
    pub fn angle(&mut self) -> f32 {
        (self.next_f32() * TAU).min(TAU_BELOW)
    }

    /// `true` with the given probability
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Pick a random element from a slice
    pub fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let i = self.next_u32() as usize % slice.len();
            Some(&slice[i])
        }
    }

    /// Shuffle a slice in place (Fisher-Yates)
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_u32() as usize % (i + 1);
            slice.swap(i, j);
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

// xorshift has a fixed point at zero
fn non_zero(state: u32) -> u32 {
    if state == 0 {
        1
    } else {
        state
    }
}

fn avalanche(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
