//! Property tests for the delay estimator and visual smoother

use proptest::prelude::*;
use rally_netcode::{EntityId, InputDelayEstimator, VisualSmoother};

fn estimator_with(samples: &[f64]) -> InputDelayEstimator {
    let mut e = InputDelayEstimator::new(64, 2, 6, 10.0, 60);
    for s in samples {
        e.add_sample(*s);
    }
    e
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Recommended delay never leaves [min_delay, max_delay]
    #[test]
    fn delay_within_clamp(samples in prop::collection::vec(0.0f64..5000.0, 0..64)) {
        let e = estimator_with(&samples);
        let delay = e.recommended_delay();
        prop_assert!((2..=6).contains(&delay));
    }

    /// Raising every sample never lowers the recommendation
    #[test]
    fn delay_non_decreasing_in_rtt(
        samples in prop::collection::vec(0.0f64..1000.0, 1..64),
        bump in 0.0f64..500.0,
    ) {
        let base = estimator_with(&samples);
        let raised: Vec<f64> = samples.iter().map(|s| s + bump).collect();
        let raised = estimator_with(&raised);

        prop_assert!(raised.percentile_75() >= base.percentile_75());
        prop_assert!(raised.recommended_delay() >= base.recommended_delay());
    }

    /// Identical samples have no jitter
    #[test]
    fn jitter_zero_for_identical_samples(value in 0.0f64..1000.0, n in 0usize..20) {
        let e = estimator_with(&vec![value; n]);
        prop_assert!(e.jitter().abs() < 1e-9);
    }

    /// A fresh correction renders at its start, a finished one at the live position
    #[test]
    fn smoother_endpoints(
        from in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        to in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        live in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        duration in 1u32..30,
    ) {
        let id = EntityId::Ball(1);
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(id, from, to, duration);
        prop_assert_eq!(smoother.smoothed_position(id, live), from);

        for _ in 0..duration {
            smoother.tick();
        }
        prop_assert!(!smoother.has_correction(id));
        prop_assert_eq!(smoother.smoothed_position(id, live), live);
    }
}
