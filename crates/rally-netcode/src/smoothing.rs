//! Visual correction smoothing
//!
//! When a prediction turns out wrong, entities are not snapped to the
//! confirmed position. Instead a short correction blends the rendered
//! position from where it was predicted to where it actually is.

use indexmap::IndexMap;
use rally_core::EntityId;

/// One in-flight correction
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub entity_id: EntityId,
    pub start_x: f32,
    pub start_y: f32,
    pub target_x: f32,
    pub target_y: f32,
    /// Frames ticked so far
    elapsed_frames: u32,
    pub duration_frames: u32,
}

impl Correction {
    /// Blend progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        (self.elapsed_frames as f32 / self.duration_frames as f32).min(1.0)
    }

    fn is_complete(&self) -> bool {
        self.elapsed_frames >= self.duration_frames
    }
}

/// Blends corrected entities toward their live positions
#[derive(Debug, Default)]
pub struct VisualSmoother {
    corrections: IndexMap<EntityId, Correction>,
}

impl VisualSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin or replace the correction for an entity
    ///
    /// A duration of zero is treated as one frame.
    pub fn start_correction(
        &mut self,
        entity_id: EntityId,
        from: (f32, f32),
        to: (f32, f32),
        duration_frames: u32,
    ) {
        self.corrections.insert(
            entity_id,
            Correction {
                entity_id,
                start_x: from.0,
                start_y: from.1,
                target_x: to.0,
                target_y: to.1,
                elapsed_frames: 0,
                duration_frames: duration_frames.max(1),
            },
        );
    }

    /// Advance every correction by one frame, dropping finished ones
    pub fn tick(&mut self) {
        for correction in self.corrections.values_mut() {
            correction.elapsed_frames = correction.elapsed_frames.saturating_add(1);
        }
        self.corrections.retain(|_, c| !c.is_complete());
    }

    /// Position to render for an entity whose live position is `actual`
    ///
    /// Without a correction this is `actual`. With one, an ease-out cubic
    /// point between start and target is blended toward `actual` by the
    /// correction's progress, so it lands on `actual` exactly when done.
    pub fn smoothed_position(&self, entity_id: EntityId, actual: (f32, f32)) -> (f32, f32) {
        let Some(c) = self.corrections.get(&entity_id) else {
            return actual;
        };
        let progress = c.progress();
        if progress >= 1.0 {
            return actual;
        }

        let t = 1.0 - (1.0 - progress).powi(3);
        let ix = c.start_x + (c.target_x - c.start_x) * t;
        let iy = c.start_y + (c.target_y - c.start_y) * t;
        (
            ix + (actual.0 - ix) * progress,
            iy + (actual.1 - iy) * progress,
        )
    }

    pub fn has_correction(&self, entity_id: EntityId) -> bool {
        self.corrections.contains_key(&entity_id)
    }

    pub fn correction(&self, entity_id: EntityId) -> Option<&Correction> {
        self.corrections.get(&entity_id)
    }

    /// Number of active corrections
    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Drop all corrections
    pub fn clear(&mut self) {
        self.corrections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BALL: EntityId = EntityId::Ball(0);

    #[test]
    fn test_pass_through_without_correction() {
        let smoother = VisualSmoother::new();
        assert_eq!(smoother.smoothed_position(BALL, (3.5, -2.0)), (3.5, -2.0));
        assert!(!smoother.has_correction(BALL));
    }

    #[test]
    fn test_starts_at_start_position() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (100.0, 100.0), (110.0, 108.0), 6);

        assert_eq!(smoother.smoothed_position(BALL, (110.0, 108.0)), (100.0, 100.0));
        // Start is independent of where the entity currently is
        assert_eq!(smoother.smoothed_position(BALL, (500.0, 0.0)), (100.0, 100.0));
    }

    #[test]
    fn test_converges_exactly() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (100.0, 100.0), (110.0, 108.0), 4);

        for _ in 0..3 {
            smoother.tick();
            assert!(smoother.has_correction(BALL));
        }
        let (x, y) = smoother.smoothed_position(BALL, (110.0, 108.0));
        assert!(x > 100.0 && x < 110.0);
        assert!(y > 100.0 && y < 108.0);

        smoother.tick();
        assert!(!smoother.has_correction(BALL));
        assert_eq!(smoother.smoothed_position(BALL, (110.0, 108.0)), (110.0, 108.0));
    }

    #[test]
    fn test_never_overshoots_live_position() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (0.0, 0.0), (100.0, 0.0), 10);

        let mut last = 0.0;
        for _ in 0..10 {
            smoother.tick();
            let (x, _) = smoother.smoothed_position(BALL, (100.0, 0.0));
            assert!(x >= last);
            assert!(x <= 100.0);
            last = x;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn test_replace_correction() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (0.0, 0.0), (10.0, 0.0), 4);
        smoother.tick();
        smoother.start_correction(BALL, (50.0, 50.0), (60.0, 60.0), 4);

        assert_eq!(smoother.len(), 1);
        assert_eq!(smoother.correction(BALL).unwrap().progress(), 0.0);
        assert_eq!(smoother.smoothed_position(BALL, (60.0, 60.0)), (50.0, 50.0));
    }

    #[test]
    fn test_zero_duration() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (0.0, 0.0), (10.0, 0.0), 0);
        assert_eq!(smoother.correction(BALL).unwrap().duration_frames, 1);
        smoother.tick();
        assert!(smoother.is_empty());
    }

    #[test]
    fn test_independent_entities_and_clear() {
        let mut smoother = VisualSmoother::new();
        smoother.start_correction(BALL, (0.0, 0.0), (10.0, 0.0), 2);
        smoother.start_correction(EntityId::Player(1), (0.0, 0.0), (0.0, 10.0), 5);

        smoother.tick();
        smoother.tick();
        assert!(!smoother.has_correction(BALL));
        assert!(smoother.has_correction(EntityId::Player(1)));

        smoother.clear();
        assert!(smoother.is_empty());
    }
}
