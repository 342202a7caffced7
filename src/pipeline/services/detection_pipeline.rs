use super::physics::{FeatureScale, PhysicsState};
use crate::config::DetectionSettings;
use crate::error::AppError;
use crate::model::Detector;
use crate::pipeline::types::{DecisionInput, DetectionResult, Frame};
use tracing::debug;

/// Detector -> nearest threat -> physics features.
pub struct DetectionPipeline {
    detector: Box<dyn Detector>,
    confidence_threshold: f32,
    actor_label: String,
    threat_label: String,
    physics: PhysicsState,
    scale: FeatureScale,
}

impl DetectionPipeline {
    pub fn new(detector: Box<dyn Detector>, settings: &DetectionSettings) -> Self {
        Self {
            detector,
            confidence_threshold: settings.confidence_threshold,
            actor_label: settings.actor_label.clone(),
            threat_label: settings.threat_label.clone(),
            physics: PhysicsState::new(settings.sentinel_distance),
            scale: FeatureScale::from_settings(settings),
        }
    }

    pub fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    pub fn reset(&mut self) {
        self.physics.reset();
    }

    pub fn process(&mut self, frame: &Frame) -> Result<DecisionInput, AppError> {
        let detections = self.detector.detect(frame, self.confidence_threshold)?;
        let result = DetectionResult::from_detections(&detections, &self.actor_label, &self.threat_label);
        let velocity = self.physics.observe(result.nearest_threat());
        let features = self.scale.normalize(&self.physics, velocity);
        debug!(
            "dx={:.1} dy={:.1} v={:.1} threats={}",
            self.physics.distance_x,
            self.physics.distance_y,
            velocity,
            result.threats.len()
        );
        Ok(DecisionInput::Features(features))
    }
}
