//! Netcode Configuration - Buffer sizes, delay clamps and correction tuning
//!
//! Loaded from RON so a game can ship its tuning next to its other data
//! files. Missing fields take their defaults.
//!
//! # Example
//!
//! ```
//! use rally_netcode::{NetcodeConfig, ReconcileMode};
//!
//! let config = NetcodeConfig::from_ron_str("(max_delay: 8, reconcile_mode: Resimulation)").unwrap();
//! assert_eq!(config.max_delay, 8);
//! assert_eq!(config.min_delay, 2);
//! assert_eq!(config.reconcile_mode, ReconcileMode::Resimulation);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a divergence is repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconcileMode {
    /// Resync the RNG and blend entities visually toward the confirmed state
    #[default]
    Smoothing,
    /// Additionally re-run the attached `Simulation` from the confirmed frame
    /// up to the local frame using buffered inputs
    Resimulation,
}

/// Configuration for the prediction engine and its components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetcodeConfig {
    /// Simulation steps per second
    pub tick_rate: u32,
    /// Snapshot history ring capacity
    pub history_capacity: usize,
    /// Frames of input retained behind the newest input
    pub input_window: u64,
    /// RTT samples kept for the delay estimate
    pub rtt_history_size: usize,
    /// Lower clamp of the recommended input delay (frames)
    pub min_delay: u32,
    /// Upper clamp of the recommended input delay (frames)
    pub max_delay: u32,
    /// Added to the one-way latency estimate (ms)
    pub safety_margin_ms: f64,
    /// Position error (pixels) above which a correction starts
    pub correction_threshold: f32,
    /// Frames a correction takes to blend out
    pub correction_frames: u32,
    /// Length of the stats reporting interval (ms)
    pub stats_interval_ms: f64,
    pub reconcile_mode: ReconcileMode,
}

impl NetcodeConfig {
    /// Parse a RON document and validate it
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: NetcodeConfig =
            ron::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.validated())
    }

    /// Coerce out-of-range values to usable ones
    ///
    /// Zero sizes and rates become 1, `max_delay` is raised to `min_delay`,
    /// and negative or non-finite tuning values fall back to their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.tick_rate = self.tick_rate.max(1);
        self.history_capacity = self.history_capacity.max(1);
        self.rtt_history_size = self.rtt_history_size.max(1);
        self.correction_frames = self.correction_frames.max(1);
        self.max_delay = self.max_delay.max(self.min_delay);
        if !(self.safety_margin_ms.is_finite() && self.safety_margin_ms >= 0.0) {
            self.safety_margin_ms = defaults.safety_margin_ms;
        }
        if !(self.correction_threshold.is_finite() && self.correction_threshold >= 0.0) {
            self.correction_threshold = defaults.correction_threshold;
        }
        if !(self.stats_interval_ms.is_finite() && self.stats_interval_ms > 0.0) {
            self.stats_interval_ms = defaults.stats_interval_ms;
        }
        self
    }
}

impl Default for NetcodeConfig {
    fn default() -> Self {
        Self {
            tick_rate: rally_core::time::DEFAULT_TICK_RATE,
            history_capacity: 128,
            input_window: 120,
            rtt_history_size: 30,
            min_delay: 2,
            max_delay: 6,
            safety_margin_ms: 10.0,
            correction_threshold: 5.0,
            correction_frames: 6,
            stats_interval_ms: 1000.0,
            reconcile_mode: ReconcileMode::Smoothing,
        }
    }
}
