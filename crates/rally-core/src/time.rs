//! Frame-based time for the fixed-timestep simulation

/// A discrete simulation step
pub type Frame = u64;

/// Player identifier assigned by the server
pub type PlayerId = u32;

/// Default simulation rate (steps per second)
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Duration of one frame in milliseconds at the given tick rate
///
/// A tick rate of zero is treated as one step per second.
pub fn frame_duration_ms(tick_rate: u32) -> f64 {
    1000.0 / f64::from(tick_rate.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert!((frame_duration_ms(60) - 16.666_666).abs() < 1e-3);
        assert_eq!(frame_duration_ms(0), 1000.0);
    }
}
