//! Client-side prediction engine
//!
//! Owns the snapshot history, input history, delay estimator, visual
//! smoother and RNG for one session, and runs the reconciliation protocol
//! when confirmed snapshots arrive from the server.
//!
//! All mutating entry points are expected to run on the simulation thread,
//! once per fixed step. Server snapshots are drained from the transport and
//! applied at a fixed point in that step.

use crate::clock::{Clock, SystemClock};
use crate::config::{NetcodeConfig, ReconcileMode};
use crate::delay::InputDelayEstimator;
use crate::input_history::InputHistory;
use crate::simulation::Simulation;
use crate::smoothing::VisualSmoother;
use crate::stats::{IntervalCounters, NetworkStats};
use crate::{Error, Result};
use rally_core::{
    decode_snapshot, Controls, Frame, GameRng, PlayerId, PlayerInput, Snapshot, StateHistory,
};
use rally_rollback_buffer::SnapshotHistory;
use std::collections::VecDeque;

/// Lifecycle of a prediction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No starting snapshot yet; input and snapshots are ignored
    Uninitialized,
    /// Predicting and reconciling
    Active,
}

/// A local input waiting for the server to reach its frame
#[derive(Debug, Clone, Copy)]
struct PendingInput {
    frame: Frame,
    sent_at_ms: f64,
}

/// Client-side prediction engine
///
/// Generic over `H: StateHistory` to allow different snapshot storage.
pub struct PredictionEngine<H: StateHistory = SnapshotHistory> {
    config: NetcodeConfig,
    state: EngineState,
    player_id: Option<PlayerId>,
    /// Newest locally predicted frame
    local_frame: Frame,
    /// Newest frame confirmed by the server
    server_frame: Frame,
    rng: GameRng,
    history: H,
    inputs: InputHistory,
    /// Unacknowledged local inputs (oldest first)
    pending: VecDeque<PendingInput>,
    delay: InputDelayEstimator,
    smoother: VisualSmoother,
    confirmed: Option<Snapshot>,
    last_predicted: Option<Snapshot>,
    next_sequence: u32,
    divergence_total: u64,
    interval: IntervalCounters,
    clock: Box<dyn Clock>,
    simulation: Option<Box<dyn Simulation>>,
}

impl PredictionEngine<SnapshotHistory> {
    /// Create an engine backed by a `SnapshotHistory` sized from the config
    pub fn new(config: NetcodeConfig) -> Self {
        let history = SnapshotHistory::new(config.history_capacity.max(1));
        Self::with_history(config, history)
    }
}

impl Default for PredictionEngine<SnapshotHistory> {
    fn default() -> Self {
        Self::new(NetcodeConfig::default())
    }
}

impl<H: StateHistory> PredictionEngine<H> {
    /// Create an engine with a custom history backend
    pub fn with_history(config: NetcodeConfig, history: H) -> Self {
        let config = config.validated();
        Self {
            inputs: InputHistory::new(config.input_window),
            delay: Self::estimator(&config),
            config,
            state: EngineState::Uninitialized,
            player_id: None,
            local_frame: 0,
            server_frame: 0,
            rng: GameRng::default(),
            history,
            pending: VecDeque::new(),
            smoother: VisualSmoother::new(),
            confirmed: None,
            last_predicted: None,
            next_sequence: 0,
            divergence_total: 0,
            interval: IntervalCounters::default(),
            clock: Box::new(SystemClock::new()),
            simulation: None,
        }
    }

    fn estimator(config: &NetcodeConfig) -> InputDelayEstimator {
        InputDelayEstimator::new(
            config.rtt_history_size,
            config.min_delay,
            config.max_delay,
            config.safety_margin_ms,
            config.tick_rate,
        )
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attach the step function used by `ReconcileMode::Resimulation`
    pub fn with_simulation(mut self, simulation: impl Simulation + 'static) -> Self {
        self.set_simulation(simulation);
        self
    }

    /// Attach or replace the step function
    pub fn set_simulation(&mut self, simulation: impl Simulation + 'static) {
        self.simulation = Some(Box::new(simulation));
    }

    /// Start a session from the server's initial snapshot
    ///
    /// Fails only when no snapshot is given. Calling this on an active
    /// engine resets it first.
    pub fn initialize(&mut self, player_id: PlayerId, initial: Option<Snapshot>) -> Result<()> {
        let snapshot = initial.ok_or(Error::MissingInitialSnapshot)?;
        if self.is_active() {
            self.reset();
        }

        self.player_id = Some(player_id);
        self.local_frame = snapshot.frame;
        self.server_frame = snapshot.frame;
        self.rng.import_state(snapshot.rng_state);
        self.interval.restart(self.clock.now_ms());
        self.history.push(snapshot.clone());
        self.confirmed = Some(snapshot);
        self.state = EngineState::Active;

        tracing::info!(player_id, frame = self.server_frame, "prediction engine initialized");
        Ok(())
    }

    /// Stamp a local input for the next frame and queue it for acknowledgement
    ///
    /// Returns the stamped input for the caller to send, or `None` when
    /// the engine is not active.
    pub fn record_local_input(&mut self, controls: Controls) -> Option<PlayerInput> {
        let Some(player_id) = self.active_player() else {
            tracing::debug!("local input ignored, engine not initialized");
            return None;
        };

        let frame = self.local_frame + 1;
        let input = PlayerInput::new(frame, player_id, controls, self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);

        self.inputs.add_input(frame, input.clone());
        self.pending.push_back(PendingInput {
            frame,
            sent_at_ms: self.clock.now_ms(),
        });
        // Bounded like the input history; the oldest is never sampled
        while self.pending.len() as u64 > self.config.input_window.max(1) {
            if let Some(dropped) = self.pending.pop_front() {
                tracing::debug!(frame = dropped.frame, "unacknowledged input evicted");
            }
        }
        Some(input)
    }

    /// Store an input received from another player
    pub fn record_remote_input(&mut self, input: PlayerInput) {
        if !self.is_active() {
            tracing::debug!(player_id = input.player_id, "remote input ignored, engine not initialized");
            return;
        }
        self.inputs.add_input(input.frame, input);
    }

    /// Store the snapshot produced by the local step
    ///
    /// Advances the local frame. Predictions at or before the confirmed
    /// frame are ignored so they cannot replace confirmed state.
    pub fn store_prediction(&mut self, snapshot: Snapshot) {
        if !self.is_active() {
            tracing::debug!(frame = snapshot.frame, "prediction ignored, engine not initialized");
            return;
        }
        if snapshot.frame <= self.server_frame {
            tracing::debug!(
                frame = snapshot.frame,
                server_frame = self.server_frame,
                "prediction at or before confirmed frame ignored"
            );
            return;
        }

        self.local_frame = self.local_frame.max(snapshot.frame);
        self.history.push(snapshot.clone());
        self.last_predicted = Some(snapshot);
    }

    /// Apply a confirmed snapshot from the server
    ///
    /// Acknowledges pending inputs up to its frame, detects divergence
    /// against the local snapshot for the same frame, and records it as the
    /// latest confirmed state. Snapshots older than the confirmed frame are
    /// skipped; re-applying the current one is harmless.
    pub fn receive_server_snapshot(&mut self, snapshot: Snapshot) {
        if !self.is_active() {
            tracing::debug!(frame = snapshot.frame, "server snapshot ignored, engine not initialized");
            return;
        }
        if snapshot.frame < self.server_frame {
            tracing::debug!(
                frame = snapshot.frame,
                server_frame = self.server_frame,
                "stale server snapshot skipped"
            );
            return;
        }

        self.acknowledge(snapshot.frame);

        let diverged = self
            .history
            .get(snapshot.frame)
            .is_some_and(|local| local.checksum != snapshot.checksum);
        if diverged {
            self.handle_divergence(&snapshot);
        }

        self.server_frame = snapshot.frame;
        self.local_frame = self.local_frame.max(self.server_frame);
        self.history.push(snapshot.clone());
        self.confirmed = Some(snapshot);
    }

    /// Decode a server snapshot message and apply it
    ///
    /// Fails only when the text is not a JSON object; malformed fields are
    /// defaulted by the decoder.
    pub fn receive_server_message(&mut self, text: &str) -> Result<()> {
        let snapshot = decode_snapshot(text)?;
        self.receive_server_snapshot(snapshot);
        Ok(())
    }

    /// Drop pending inputs the server has reached, sampling their RTT
    fn acknowledge(&mut self, frame: Frame) {
        let now = self.clock.now_ms();
        while let Some(pending) = self.pending.front().copied() {
            if pending.frame > frame {
                break;
            }
            self.pending.pop_front();
            self.delay.add_sample(now - pending.sent_at_ms);
        }
    }

    fn handle_divergence(&mut self, confirmed: &Snapshot) {
        let gap = self.local_frame.saturating_sub(confirmed.frame);
        self.divergence_total += 1;
        self.interval.record(gap);

        let predicted = self
            .last_predicted
            .as_ref()
            .or_else(|| self.history.get(confirmed.frame));
        tracing::debug!(
            frame = confirmed.frame,
            local_frame = self.local_frame,
            predicted_checksum = predicted.map(|p| p.checksum),
            confirmed_checksum = confirmed.checksum,
            "prediction diverged from server"
        );

        if let Some(predicted) = predicted {
            let threshold = self.config.correction_threshold;
            for (id, cx, cy) in confirmed.entity_positions() {
                let Some((px, py)) = predicted.position(id) else {
                    continue;
                };
                if (cx - px).hypot(cy - py) > threshold {
                    tracing::debug!(entity = %id, px, py, cx, cy, "starting visual correction");
                    self.smoother.start_correction(
                        id,
                        (px, py),
                        (cx, cy),
                        self.config.correction_frames,
                    );
                }
            }
        }

        self.rng.import_state(confirmed.rng_state);

        if self.config.reconcile_mode == ReconcileMode::Resimulation {
            self.resimulate(confirmed);
        }
    }

    /// Re-run frames after `confirmed` up to the local frame
    fn resimulate(&mut self, confirmed: &Snapshot) {
        let Some(simulation) = self.simulation.as_mut() else {
            tracing::warn!("resimulation configured without a simulation, smoothing only");
            return;
        };

        let mut state = confirmed.clone();
        for frame in confirmed.frame + 1..=self.local_frame {
            let inputs: Vec<PlayerInput> = self.inputs.frame_inputs(frame).cloned().collect();
            let mut next = simulation.step(&state, &inputs, &mut self.rng);
            next.frame = frame;
            next.rng_state = self.rng.export_state();
            next.checksum = next.compute_checksum();
            self.history.push(next.clone());
            state = next;
        }

        tracing::debug!(
            from = confirmed.frame,
            to = self.local_frame,
            "resimulated frames after divergence"
        );
        if state.frame > confirmed.frame {
            self.last_predicted = Some(state);
        }
    }

    /// Latest confirmed snapshot with every entity at its smoothed position
    pub fn display_state(&self) -> Option<Snapshot> {
        let mut display = self.confirmed.clone()?;
        let positions: Vec<_> = display.entity_positions().collect();
        for (id, x, y) in positions {
            let (sx, sy) = self.smoother.smoothed_position(id, (x, y));
            display.set_position(id, sx, sy);
        }
        Some(display)
    }

    /// Current network statistics
    ///
    /// Interval counters restart once the reporting interval has elapsed,
    /// after being included in this report.
    pub fn network_stats(&mut self) -> NetworkStats {
        let stats = NetworkStats {
            average_rtt_ms: self.delay.average_rtt(),
            jitter_ms: self.delay.jitter(),
            recommended_delay: self.delay.recommended_delay(),
            divergences: self.interval.divergences,
            mean_divergence_gap: self.interval.mean_gap(),
            divergence_total: self.divergence_total,
            frames_ahead: self.frames_ahead(),
            pending_inputs: self.pending.len(),
        };

        let now = self.clock.now_ms();
        if now - self.interval.started_ms >= self.config.stats_interval_ms {
            self.interval.restart(now);
        }
        stats
    }

    /// Advance visual corrections by one simulation step
    pub fn tick(&mut self) {
        if self.is_active() {
            self.smoother.tick();
        }
    }

    /// Clear every component and return to `Uninitialized`
    pub fn reset(&mut self) {
        self.history.clear();
        self.inputs.clear();
        self.pending.clear();
        self.delay.clear();
        self.smoother.clear();
        self.rng = GameRng::default();
        self.confirmed = None;
        self.last_predicted = None;
        self.player_id = None;
        self.local_frame = 0;
        self.server_frame = 0;
        self.next_sequence = 0;
        self.divergence_total = 0;
        self.interval.restart(self.clock.now_ms());
        self.state = EngineState::Uninitialized;
        tracing::info!("prediction engine reset");
    }

    fn active_player(&self) -> Option<PlayerId> {
        if self.is_active() {
            self.player_id
        } else {
            None
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EngineState::Active
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    /// Get the newest predicted frame
    pub fn local_frame(&self) -> Frame {
        self.local_frame
    }

    /// Get the newest confirmed frame
    pub fn server_frame(&self) -> Frame {
        self.server_frame
    }

    /// Get the number of frames we're ahead of the server
    pub fn frames_ahead(&self) -> u64 {
        self.local_frame.saturating_sub(self.server_frame)
    }

    /// Get the number of unacknowledged local inputs
    pub fn pending_inputs(&self) -> usize {
        self.pending.len()
    }

    /// Frames of input delay currently recommended
    pub fn recommended_delay(&self) -> u32 {
        self.delay.recommended_delay()
    }

    /// The session RNG, synchronized to the server on divergence
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    /// Mutable RNG for the local step function
    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    pub fn confirmed(&self) -> Option<&Snapshot> {
        self.confirmed.as_ref()
    }

    pub fn last_predicted(&self) -> Option<&Snapshot> {
        self.last_predicted.as_ref()
    }

    /// Get access to the snapshot history
    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn input_history(&self) -> &InputHistory {
        &self.inputs
    }

    pub fn smoother(&self) -> &VisualSmoother {
        &self.smoother
    }

    pub fn delay_estimator(&self) -> &InputDelayEstimator {
        &self.delay
    }

    pub fn config(&self) -> &NetcodeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rally_core::{Ball, EntityId};

    fn snapshot(frame: Frame, ball: (f32, f32)) -> Snapshot {
        let mut s = Snapshot::new(frame);
        s.rng_state = 1000 + frame as u32;
        s.balls.push(Ball {
            id: 0,
            x: ball.0,
            y: ball.1,
            ..Default::default()
        });
        s.with_checksum()
    }

    fn engine() -> (PredictionEngine, ManualClock) {
        let clock = ManualClock::new();
        let engine = PredictionEngine::new(NetcodeConfig::default()).with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_initialize_requires_snapshot() {
        let (mut engine, _) = engine();
        let err = engine.initialize(1, None).unwrap_err();
        assert!(matches!(err, Error::MissingInitialSnapshot));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.display_state().is_none());
    }

    #[test]
    fn test_initialize() {
        let (mut engine, _) = engine();
        engine.initialize(7, Some(snapshot(42, (0.0, 0.0)))).unwrap();

        assert!(engine.is_active());
        assert_eq!(engine.player_id(), Some(7));
        assert_eq!(engine.local_frame(), 42);
        assert_eq!(engine.server_frame(), 42);
        assert_eq!(engine.rng().export_state(), 1042);
        assert_eq!(engine.history().get(42).map(|s| s.frame), Some(42));
    }

    #[test]
    fn test_inactive_calls_are_ignored() {
        let (mut engine, _) = engine();
        assert!(engine.record_local_input(Controls::default()).is_none());
        engine.receive_server_snapshot(snapshot(5, (0.0, 0.0)));
        engine.store_prediction(snapshot(6, (0.0, 0.0)));
        engine.tick();

        assert_eq!(engine.server_frame(), 0);
        assert!(engine.history().is_empty());
        assert!(engine.confirmed().is_none());
    }

    #[test]
    fn test_record_local_input_stamps_next_frame() {
        let (mut engine, _) = engine();
        engine.initialize(3, Some(snapshot(10, (0.0, 0.0)))).unwrap();

        let a = engine.record_local_input(Controls::default()).unwrap();
        assert_eq!(a.frame, 11);
        assert_eq!(a.player_id, 3);
        assert_eq!(a.sequence, 0);

        engine.store_prediction(snapshot(11, (1.0, 0.0)));
        let b = engine.record_local_input(Controls::default()).unwrap();
        assert_eq!(b.frame, 12);
        assert_eq!(b.sequence, 1);

        assert_eq!(engine.pending_inputs(), 2);
        assert!(engine.input_history().get_player_input(12, 3).is_some());
    }

    #[test]
    fn test_ack_feeds_rtt() {
        let (mut engine, clock) = engine();
        engine.initialize(1, Some(snapshot(0, (0.0, 0.0)))).unwrap();

        for frame in 1..=3 {
            engine.record_local_input(Controls::default());
            engine.store_prediction(snapshot(frame, (0.0, 0.0)));
            clock.advance(10.0);
        }
        // Inputs for frames 1, 2, 3 sent at 0, 10, 20ms; ack at 50ms
        clock.set(50.0);
        engine.receive_server_snapshot(snapshot(2, (0.0, 0.0)));

        assert_eq!(engine.pending_inputs(), 1);
        assert_eq!(engine.delay_estimator().sample_count(), 2);
        assert_eq!(engine.delay_estimator().average_rtt(), 45.0);
        assert_eq!(engine.server_frame(), 2);
        assert_eq!(engine.frames_ahead(), 1);
    }

    #[test]
    fn test_stale_snapshot_skipped() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(10, (0.0, 0.0)))).unwrap();
        engine.receive_server_snapshot(snapshot(12, (5.0, 0.0)));
        engine.receive_server_snapshot(snapshot(11, (9.0, 9.0)));

        assert_eq!(engine.server_frame(), 12);
        assert_eq!(engine.confirmed().map(|s| s.frame), Some(12));
    }

    #[test]
    fn test_server_ahead_pulls_local_frame() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(0, (0.0, 0.0)))).unwrap();
        engine.receive_server_snapshot(snapshot(20, (0.0, 0.0)));

        assert_eq!(engine.local_frame(), 20);
        assert_eq!(engine.frames_ahead(), 0);
        assert_eq!(engine.record_local_input(Controls::default()).unwrap().frame, 21);
    }

    #[test]
    fn test_prediction_before_confirmed_ignored() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(10, (0.0, 0.0)))).unwrap();
        engine.store_prediction(snapshot(10, (50.0, 50.0)));

        assert!(engine.last_predicted().is_none());
        assert_eq!(
            engine.history().get(10).map(|s| s.balls[0].x),
            Some(0.0)
        );
    }

    #[test]
    fn test_divergence_resyncs_rng() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(0, (0.0, 0.0)))).unwrap();
        engine.store_prediction(snapshot(1, (100.0, 100.0)));
        engine.rng_mut().next_u32();

        engine.receive_server_snapshot(snapshot(1, (110.0, 108.0)));

        assert_eq!(engine.rng().export_state(), 1001);
        assert!(engine.smoother().has_correction(EntityId::Ball(0)));
    }

    #[test]
    fn test_pending_inputs_bounded_by_input_window() {
        let clock = ManualClock::new();
        let config = NetcodeConfig {
            input_window: 4,
            ..Default::default()
        };
        let mut engine = PredictionEngine::new(config).with_clock(clock.clone());
        engine.initialize(1, Some(snapshot(0, (0.0, 0.0)))).unwrap();

        for frame in 1..=10 {
            engine.record_local_input(Controls::default());
            engine.store_prediction(snapshot(frame, (0.0, 0.0)));
            clock.advance(10.0);
        }
        assert_eq!(engine.pending_inputs(), 4);

        // Only the four retained inputs (frames 7..=10) are sampled
        engine.receive_server_snapshot(snapshot(10, (0.0, 0.0)));
        assert_eq!(engine.pending_inputs(), 0);
        assert_eq!(engine.delay_estimator().sample_count(), 4);
    }

    #[test]
    fn test_receive_server_message() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(0, (0.0, 0.0)))).unwrap();

        engine
            .receive_server_message(r#"{ "frame": 3, "rngState": 77 }"#)
            .unwrap();
        assert_eq!(engine.server_frame(), 3);
        assert_eq!(engine.confirmed().map(|s| s.rng_state), Some(77));

        let err = engine.receive_server_message("not json").unwrap_err();
        assert!(matches!(err, Error::Core(rally_core::Error::Decode(_))));
        assert_eq!(engine.server_frame(), 3);
    }

    #[test]
    fn test_reset() {
        let (mut engine, _) = engine();
        engine.initialize(1, Some(snapshot(5, (0.0, 0.0)))).unwrap();
        engine.record_local_input(Controls::default());
        engine.store_prediction(snapshot(6, (100.0, 0.0)));
        engine.receive_server_snapshot(snapshot(6, (0.0, 0.0)));

        engine.reset();

        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.history().is_empty());
        assert!(engine.input_history().is_empty());
        assert!(engine.smoother().is_empty());
        assert_eq!(engine.pending_inputs(), 0);
        assert_eq!(engine.local_frame(), 0);
        assert_eq!(engine.network_stats().divergence_total, 0);

        // Can start again
        engine.initialize(2, Some(snapshot(0, (0.0, 0.0)))).unwrap();
        assert!(engine.is_active());
    }
}
