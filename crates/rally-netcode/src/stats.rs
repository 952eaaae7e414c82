//! Network statistics for telemetry and HUD display

use serde::{Deserialize, Serialize};

/// Snapshot of the engine's network health
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Mean round-trip time (ms)
    pub average_rtt_ms: f64,
    /// Standard deviation of round-trip times (ms)
    pub jitter_ms: f64,
    /// Recommended input delay (frames)
    pub recommended_delay: u32,
    /// Divergences detected in the current reporting interval
    pub divergences: u32,
    /// Mean frames between the local frame and the divergent frame, over the
    /// current reporting interval
    pub mean_divergence_gap: f64,
    /// Divergences since initialization
    pub divergence_total: u64,
    /// `local_frame - server_frame`
    pub frames_ahead: u64,
    /// Inputs sent but not yet acknowledged
    pub pending_inputs: usize,
}

/// Per-interval divergence counters
#[derive(Debug, Default)]
pub(crate) struct IntervalCounters {
    pub started_ms: f64,
    pub divergences: u32,
    pub gap_sum: u64,
}

impl IntervalCounters {
    pub fn record(&mut self, gap: u64) {
        self.divergences += 1;
        self.gap_sum += gap;
    }

    pub fn mean_gap(&self) -> f64 {
        if self.divergences == 0 {
            0.0
        } else {
            self.gap_sum as f64 / f64::from(self.divergences)
        }
    }

    pub fn restart(&mut self, now_ms: f64) {
        *self = Self {
            started_ms: now_ms,
            ..Default::default()
        };
    }
}
