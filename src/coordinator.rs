use crate::{
    capture::FrameSource,
    clock::Clock,
    config::{CaptureFailurePolicy, Settings},
    controller::{ControlEvent, ControlKeys, RunController},
    error::AppError,
    input::KeyState,
    journal::OutcomeLogger,
    pipeline::{pipeline_factory::AutopilotPipeline, ActionActuator},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Single-threaded perception-action loop. Each iteration handles keys,
/// then captures, perceives, scores and acts, in that order.
pub struct Coordinator<C: Clock> {
    clock: C,
    keys: Box<dyn KeyState>,
    bindings: ControlKeys,
    frames: Box<dyn FrameSource>,
    pipeline: AutopilotPipeline,
    actuator: ActionActuator,
    logger: OutcomeLogger,
    run: RunController,
    idle_poll: Duration,
    on_capture_failure: CaptureFailurePolicy,
    cancel_token: CancellationToken,
}

impl<C: Clock> Coordinator<C> {
    pub fn run_controller(&self) -> &RunController {
        &self.run
    }

    pub fn pipeline(&self) -> &AutopilotPipeline {
        &self.pipeline
    }

    /// Runs until the quit key, cancellation, or a fatal error.
    pub fn run(mut self) -> Result<(), AppError> {
        while self.step()? == LoopControl::Continue {}
        Ok(())
    }

    pub fn step(&mut self) -> Result<LoopControl, AppError> {
        if self.cancel_token.is_cancelled() {
            return Ok(LoopControl::Quit);
        }

        match self.run.poll(self.keys.as_ref(), &self.bindings, &self.clock) {
            Some(ControlEvent::Quit) => {
                info!("Bot Stopped by user.");
                return Ok(LoopControl::Quit);
            }
            Some(ControlEvent::MarkLost) => {
                let segment = self.run.mark_lost(&self.clock);
                self.logger.record_segment(&segment)?;
            }
            Some(ControlEvent::MarkWon) => {
                let segment = self.run.mark_won(&self.clock);
                self.logger.record_segment(&segment)?;
            }
            Some(ControlEvent::Toggle) => {
                self.run.toggle(&mut self.pipeline.perception, &self.clock);
            }
            None => {}
        }

        if !self.run.is_active() {
            self.clock.sleep(self.idle_poll);
            return Ok(LoopControl::Continue);
        }

        let frame = match self.frames.grab() {
            Ok(frame) => frame,
            Err(e) => return Err(self.capture_failed(e)),
        };

        let Some(input) = self.pipeline.perception.perceive(&frame)? else {
            return Ok(LoopControl::Continue);
        };
        let probability = self.pipeline.engine.score(&input)?;
        debug!("frame {} scored {:.3}", frame.frame_id(), probability);
        self.actuator
            .maybe_act(probability, self.pipeline.decision_threshold, &self.clock)?;
        Ok(LoopControl::Continue)
    }

    fn capture_failed(&mut self, failure: AppError) -> AppError {
        error!("[ERROR] {}", failure);
        if self.on_capture_failure == CaptureFailurePolicy::LogAborted {
            if let Some(segment) = self.run.abort(&self.clock) {
                if let Err(e) = self.logger.record_segment(&segment) {
                    error!("Failed to record aborted run: {}", e);
                }
            }
        }
        failure
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

pub struct CoordinatorBuilder<C: Clock> {
    settings: Settings,
    clock: C,
    keys: Option<Box<dyn KeyState>>,
    frames: Option<Box<dyn FrameSource>>,
    pipeline: Option<AutopilotPipeline>,
    actuator: Option<ActionActuator>,
    logger: Option<OutcomeLogger>,
    cancel_token: CancellationToken,
}

impl<C: Clock> CoordinatorBuilder<C> {
    pub fn new(settings: Settings, clock: C) -> Self {
        Self {
            settings,
            clock,
            keys: None,
            frames: None,
            pipeline: None,
            actuator: None,
            logger: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn keys(mut self, keys: Box<dyn KeyState>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn frames(mut self, frames: Box<dyn FrameSource>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn pipeline(mut self, pipeline: AutopilotPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn actuator(mut self, actuator: ActionActuator) -> Self {
        self.actuator = Some(actuator);
        self
    }

    // Overrides the logger derived from the pipeline variant's settings.
    pub fn logger(mut self, logger: OutcomeLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn build(self) -> Result<Coordinator<C>, AppError> {
        let missing = |part: &str| AppError::InvalidConfig(format!("coordinator {} not set", part));
        let pipeline = self.pipeline.ok_or_else(|| missing("pipeline"))?;
        let logger = match self.logger {
            Some(logger) => logger,
            None => OutcomeLogger::for_variant(&self.settings, pipeline.variant()),
        };
        Ok(Coordinator {
            clock: self.clock,
            keys: self.keys.ok_or_else(|| missing("key monitor"))?,
            bindings: ControlKeys::from_settings(&self.settings.controls),
            frames: self.frames.ok_or_else(|| missing("frame source"))?,
            actuator: self.actuator.ok_or_else(|| missing("actuator"))?,
            pipeline,
            logger,
            run: RunController::new(&self.settings.timing),
            idle_poll: self.settings.timing.idle_poll(),
            on_capture_failure: self.settings.capture.on_failure,
            cancel_token: self.cancel_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{DetectionSettings, EncodingSettings, SegmentSchema};
    use crate::controller::RunState;
    use crate::input::{InputMonitor, KeyEventSink};
    use crate::model::{Detector, Encoder, FeatureClassifier, SequenceClassifier};
    use crate::pipeline::services::action_actuator::tests::RecordingPresser;
    use crate::pipeline::services::{DecisionEngine, DetectionPipeline, EncodingPipeline};
    use crate::pipeline::types::{BoundingBox, Detection, FeatureVector, LatentVector};
    use crate::pipeline::{Frame, PerceptionPipeline};
    use chrono::{Local, Utc};
    use image::RgbImage;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Returns fresh blank frames until `limit` grabs, then fails.
    struct BlankFrames {
        limit: usize,
    }

    impl FrameSource for BlankFrames {
        fn grab(&mut self) -> Result<Frame, AppError> {
            if self.limit == 0 {
                return Err(AppError::Capture("permission denied".to_string()));
            }
            self.limit -= 1;
            Ok(Frame::new(RgbImage::new(4, 4), Utc::now()))
        }
    }

    /// Replays one detection batch per frame, then nothing.
    struct ScriptedDetector {
        batches: VecDeque<Vec<Detection>>,
    }

    impl Detector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame, _confidence_threshold: f32) -> Result<Vec<Detection>, AppError> {
            Ok(self.batches.pop_front().unwrap_or_default())
        }
    }

    /// Scores 0.9 for the jump situation, 0.0 otherwise, and records inputs.
    #[derive(Clone, Default)]
    struct JumpClassifier {
        seen: Arc<Mutex<Vec<FeatureVector>>>,
    }

    impl FeatureClassifier for JumpClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<f32, AppError> {
            self.seen.lock().unwrap().push(*features);
            let target = [0.1, 0.0, 2.0];
            let hit = features.iter().zip(target).all(|(a, b)| (a - b).abs() < 1e-4);
            Ok(if hit { 0.9 } else { 0.0 })
        }
    }

    struct ConstantEncoder;

    impl Encoder for ConstantEncoder {
        fn input_len(&self) -> usize {
            2
        }

        fn latent_dim(&self) -> usize {
            1
        }

        fn encode(&self, _pixels: &[f32]) -> Result<LatentVector, AppError> {
            Ok(LatentVector::new(vec![1.0]))
        }
    }

    struct AlwaysJump;

    impl SequenceClassifier for AlwaysJump {
        fn predict(&self, _sequence: &[LatentVector]) -> Result<f32, AppError> {
            Ok(1.0)
        }
    }

    fn boxed(label: &str, cx: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(cx - 5.0, 95.0, cx + 5.0, 105.0),
        }
    }

    fn logger(dir: &Path) -> OutcomeLogger {
        OutcomeLogger::new(
            dir.join("segments.txt"),
            SegmentSchema::ByOutcome,
            dir.join("game_log.txt"),
            None,
        )
    }

    struct Harness<'a> {
        coordinator: Coordinator<&'a ManualClock>,
        sink: KeyEventSink,
        presses: RecordingPresser,
    }

    impl Harness<'_> {
        fn tap(&mut self, key: &str) -> LoopControl {
            self.sink.press(key);
            let control = self.coordinator.step().unwrap();
            self.sink.release(key);
            control
        }

        fn presses(&self) -> Vec<&'static str> {
            self.presses.events.lock().unwrap().clone()
        }
    }

    fn harness<'a>(
        clock: &'a ManualClock,
        settings: Settings,
        pipeline: AutopilotPipeline,
        frames: usize,
        dir: &Path,
    ) -> Harness<'a> {
        let (monitor, sink) = InputMonitor::with_sink();
        let presses = RecordingPresser::default();
        let coordinator = CoordinatorBuilder::new(settings, clock)
            .keys(Box::new(monitor))
            .frames(Box::new(BlankFrames { limit: frames }))
            .pipeline(pipeline)
            .actuator(ActionActuator::new(
                Box::new(presses.clone()),
                Duration::from_millis(40),
            ))
            .logger(logger(dir))
            .build()
            .unwrap();
        Harness {
            coordinator,
            sink,
            presses,
        }
    }

    fn detection_pipeline(batches: Vec<Vec<Detection>>, classifier: JumpClassifier) -> AutopilotPipeline {
        let settings = DetectionSettings::default();
        AutopilotPipeline {
            perception: PerceptionPipeline::Detection(DetectionPipeline::new(
                Box::new(ScriptedDetector {
                    batches: batches.into(),
                }),
                &settings,
            )),
            engine: DecisionEngine::Features(Box::new(classifier)),
            decision_threshold: settings.decision_threshold,
        }
    }

    fn encoding_pipeline(sequence_length: usize) -> AutopilotPipeline {
        let settings = EncodingSettings {
            width: 2,
            height: 1,
            sequence_length,
            ..EncodingSettings::default()
        };
        AutopilotPipeline {
            perception: PerceptionPipeline::Encoding(
                EncodingPipeline::new(Box::new(ConstantEncoder), &settings).unwrap(),
            ),
            engine: DecisionEngine::Sequence(Box::new(AlwaysJump)),
            decision_threshold: settings.decision_threshold,
        }
    }

    #[test]
    fn dropout_frames_keep_velocity_zero_and_never_act() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let classifier = JumpClassifier::default();
        let pipeline = detection_pipeline(vec![Vec::new(); 3], classifier.clone());
        let mut h = harness(&clock, Settings::default(), pipeline, 3, dir.path());

        assert_eq!(h.tap("p"), LoopControl::Continue);
        h.coordinator.step().unwrap();
        h.coordinator.step().unwrap();

        let seen = classifier.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![[1.0, 0.0, 0.0]; 3]);
        assert!(h.presses().is_empty());
    }

    #[test]
    fn jump_features_press_and_release_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let batches = vec![
            vec![boxed("cuphead", 100.0), boxed("projectile", 128.0)],
            vec![boxed("cuphead", 100.0), boxed("projectile", 228.0)],
        ];
        let pipeline = detection_pipeline(batches, JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 2, dir.path());

        h.tap("p");
        assert!(h.presses().is_empty());
        h.coordinator.step().unwrap();
        assert_eq!(h.presses(), vec!["press", "release"]);
    }

    #[test]
    fn mark_lost_after_run_writes_both_logs() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 10, dir.path());

        h.tap("p");
        let resumed_at = clock.monotonic();
        clock.advance(Duration::from_millis(12_500) - resumed_at);
        h.tap("1");
        assert_eq!(*h.coordinator.run_controller().state(), RunState::Paused);

        let segments = std::fs::read_to_string(dir.path().join("segments.txt")).unwrap();
        assert_eq!(segments, "12.50,LOST\n");
        let narrative = std::fs::read_to_string(dir.path().join("game_log.txt")).unwrap();
        assert!(narrative.ends_with(" - LOST - Survived: 12.50s\n"));
    }

    #[test]
    fn outcome_without_run_logs_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 0, dir.path());

        assert_eq!(h.tap("2"), LoopControl::Continue);
        assert!(!dir.path().join("segments.txt").exists());
        let narrative = std::fs::read_to_string(dir.path().join("game_log.txt")).unwrap();
        assert!(narrative.ends_with(" - WON - Survived: 0.00s\n"));
    }

    #[test]
    fn double_toggle_inside_debounce_changes_state_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 10, dir.path());

        h.tap("p");
        h.tap("p");
        assert!(h.coordinator.run_controller().is_active());
    }

    #[test]
    fn long_toggle_press_changes_state_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 100, dir.path());

        h.sink.press("p");
        let mut was_active = h.coordinator.run_controller().is_active();
        let mut changes = 0;
        for _ in 0..20 {
            h.coordinator.step().unwrap();
            let active = h.coordinator.run_controller().is_active();
            if active != was_active {
                changes += 1;
                was_active = active;
            }
            clock.advance(Duration::from_millis(10));
        }
        h.sink.release("p");
        h.coordinator.step().unwrap();

        assert_eq!(changes, 1);
        assert!(h.coordinator.run_controller().is_active());
    }

    #[test]
    fn sequence_decisions_wait_for_a_full_window() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let mut settings = Settings::default();
        settings.pipeline.variant = crate::config::PipelineVariant::Encoding;
        let mut h = harness(&clock, settings, encoding_pipeline(10), 40, dir.path());

        h.tap("p");
        for _ in 0..8 {
            h.coordinator.step().unwrap();
        }
        assert!(h.presses().is_empty());
        h.coordinator.step().unwrap();
        assert_eq!(h.presses(), vec!["press", "release"]);

        // Pause and resume: the window refills from empty.
        clock.advance(Duration::from_millis(200));
        h.tap("p");
        clock.advance(Duration::from_millis(200));
        h.tap("p");
        for _ in 0..8 {
            h.coordinator.step().unwrap();
        }
        assert_eq!(h.presses().len(), 2);
    }

    #[test]
    fn paused_loop_idles_without_capturing() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 0, dir.path());

        assert_eq!(h.coordinator.step().unwrap(), LoopControl::Continue);
        assert_eq!(clock.monotonic(), Duration::from_millis(100));
    }

    #[test]
    fn quit_and_cancellation_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 0, dir.path());
        assert_eq!(h.tap("q"), LoopControl::Quit);

        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let h = harness(&clock, Settings::default(), pipeline, 0, dir.path());
        h.coordinator.stop();
        h.coordinator.run().unwrap();
    }

    #[test]
    fn capture_failure_discards_run_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, Settings::default(), pipeline, 0, dir.path());

        h.sink.press("p");
        assert!(matches!(h.coordinator.step(), Err(AppError::Capture(_))));
        assert!(!dir.path().join("segments.txt").exists());
        assert!(!dir.path().join("game_log.txt").exists());
    }

    #[test]
    fn capture_failure_can_log_aborted_run() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local::now());
        let mut settings = Settings::default();
        settings.capture.on_failure = CaptureFailurePolicy::LogAborted;
        let pipeline = detection_pipeline(Vec::new(), JumpClassifier::default());
        let mut h = harness(&clock, settings, pipeline, 1, dir.path());

        h.tap("p");
        clock.advance(Duration::from_secs(3));
        let error = h.coordinator.step().unwrap_err();
        assert!(error.to_string().contains("Screen Recording"));

        let segments = std::fs::read_to_string(dir.path().join("segments.txt")).unwrap();
        assert_eq!(segments, "3.00,ABORTED\n");
    }

    #[test]
    fn builder_requires_every_part() {
        let clock = ManualClock::new(Local::now());
        let result = CoordinatorBuilder::new(Settings::default(), &clock).build();
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }
}
