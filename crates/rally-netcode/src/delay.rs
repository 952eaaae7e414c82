//! Adaptive input delay
//!
//! Tracks recent round-trip times and recommends how many frames local
//! input should be buffered so remote inputs for the same frame are likely
//! to have arrived.

use rally_core::time::frame_duration_ms;
use std::collections::VecDeque;

/// Input-delay estimator over a bounded list of RTT samples
#[derive(Debug)]
pub struct InputDelayEstimator {
    /// Samples in milliseconds (oldest first)
    samples: VecDeque<f64>,
    history_size: usize,
    min_delay: u32,
    max_delay: u32,
    safety_margin_ms: f64,
    tick_rate: u32,
}

impl InputDelayEstimator {
    /// Create an estimator
    ///
    /// `max_delay` is raised to `min_delay` if smaller.
    pub fn new(
        history_size: usize,
        min_delay: u32,
        max_delay: u32,
        safety_margin_ms: f64,
        tick_rate: u32,
    ) -> Self {
        let history_size = history_size.max(1);
        Self {
            samples: VecDeque::with_capacity(history_size),
            history_size,
            min_delay,
            max_delay: max_delay.max(min_delay),
            safety_margin_ms,
            tick_rate,
        }
    }

    /// Record one round-trip time
    ///
    /// Negative or non-finite samples are ignored.
    pub fn add_sample(&mut self, rtt_ms: f64) {
        if !(rtt_ms.is_finite() && rtt_ms >= 0.0) {
            tracing::debug!(rtt_ms, "ignoring invalid RTT sample");
            return;
        }
        if self.samples.len() == self.history_size {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
        tracing::trace!(rtt_ms, samples = self.samples.len(), "RTT sample");
    }

    /// 75th-percentile RTT, `None` without samples
    ///
    /// Nearest-rank on the sorted samples at index `floor((n - 1) * 0.75)`.
    pub fn percentile_75(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let index = (sorted.len() - 1) * 3 / 4;
        Some(sorted[index])
    }

    /// Frames of input delay to use, always within `[min_delay, max_delay]`
    pub fn recommended_delay(&self) -> u32 {
        let Some(p75) = self.percentile_75() else {
            return self.min_delay;
        };
        let one_way = p75 / 2.0 + self.safety_margin_ms;
        let frames = (one_way / frame_duration_ms(self.tick_rate)).ceil();
        // Saturating float-to-int cast, then clamp
        (frames as u32).clamp(self.min_delay, self.max_delay)
    }

    /// Mean RTT, 0 without samples
    pub fn average_rtt(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population standard deviation of the samples, 0 for fewer than two
    pub fn jitter(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let mean = self.average_rtt();
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean) * (s - mean))
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }

    /// Number of stored samples
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn min_delay(&self) -> u32 {
        self.min_delay
    }

    pub fn max_delay(&self) -> u32 {
        self.max_delay
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
