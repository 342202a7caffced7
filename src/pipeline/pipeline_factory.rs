use crate::config::{PipelineVariant, Settings};
use crate::error::AppError;
use crate::model::{ColorBlobDetector, DenseEncoder, Encoder, GruClassifier, MlpClassifier};
use crate::pipeline::services::{DecisionEngine, DetectionPipeline, EncodingPipeline, PerceptionPipeline};
use tracing::info;

/// Perception and decision halves for one variant, plus its threshold.
pub struct AutopilotPipeline {
    pub perception: PerceptionPipeline,
    pub engine: DecisionEngine,
    pub decision_threshold: f32,
}

impl AutopilotPipeline {
    pub fn variant(&self) -> PipelineVariant {
        self.perception.variant()
    }
}

/// Builds the configured variant and loads its model artifacts. Missing or
/// malformed artifacts fail startup.
pub struct PipelineFactory;

impl PipelineFactory {
    pub fn create(settings: &Settings) -> Result<AutopilotPipeline, AppError> {
        info!("Loading {} pipeline models...", settings.pipeline.variant.as_str());
        match settings.pipeline.variant {
            PipelineVariant::Detection => Self::create_detection(settings),
            PipelineVariant::Encoding => Self::create_encoding(settings),
        }
    }

    fn create_detection(settings: &Settings) -> Result<AutopilotPipeline, AppError> {
        let detection = &settings.detection;
        let detector = ColorBlobDetector::new(&detection.detector);
        let classifier = MlpClassifier::load(&detection.model_path)?;
        Ok(AutopilotPipeline {
            perception: PerceptionPipeline::Detection(DetectionPipeline::new(
                Box::new(detector),
                detection,
            )),
            engine: DecisionEngine::Features(Box::new(classifier)),
            decision_threshold: detection.decision_threshold,
        })
    }

    fn create_encoding(settings: &Settings) -> Result<AutopilotPipeline, AppError> {
        let encoding = &settings.encoding;
        let encoder = DenseEncoder::load(&encoding.encoder_path)?;
        let classifier = GruClassifier::load(&encoding.classifier_path)?;
        if classifier.input_dim() != encoder.latent_dim() {
            return Err(AppError::ModelShape(format!(
                "sequence classifier takes {}-dim latents but the encoder produces {}",
                classifier.input_dim(),
                encoder.latent_dim()
            )));
        }
        Ok(AutopilotPipeline {
            perception: PerceptionPipeline::Encoding(EncodingPipeline::new(
                Box::new(encoder),
                encoding,
            )?),
            engine: DecisionEngine::Sequence(Box::new(classifier)),
            decision_threshold: encoding.decision_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn builds_detection_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.detection.model_path = write(
            dir.path(),
            "mlp.json",
            r#"{"layers":[{"weights":[[1.0],[0.0],[0.0]],"bias":[0.0],"activation":"sigmoid"}]}"#,
        );
        let pipeline = PipelineFactory::create(&settings).unwrap();
        assert_eq!(pipeline.variant(), PipelineVariant::Detection);
        assert_eq!(pipeline.decision_threshold, 0.78);
    }

    #[test]
    fn builds_encoding_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.pipeline.variant = PipelineVariant::Encoding;
        settings.encoding.width = 2;
        settings.encoding.height = 1;
        settings.encoding.encoder_path = write(
            dir.path(),
            "encoder.json",
            r#"{"layers":[{"weights":[[1.0],[1.0]],"bias":[0.0],"activation":"relu"}]}"#,
        );
        settings.encoding.classifier_path = write(
            dir.path(),
            "gru.json",
            r#"{"units":1,"kernel":[[0.0,0.0,1.0]],"recurrent_kernel":[[0.0,0.0,0.0]],"bias":[0.0,0.0,0.0],"head":{"weights":[[1.0]],"bias":[0.0],"activation":"sigmoid"}}"#,
        );
        let pipeline = PipelineFactory::create(&settings).unwrap();
        assert_eq!(pipeline.variant(), PipelineVariant::Encoding);
        assert_eq!(pipeline.decision_threshold, 0.36);
    }

    #[test]
    fn latent_width_mismatch_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.pipeline.variant = PipelineVariant::Encoding;
        settings.encoding.width = 2;
        settings.encoding.height = 1;
        settings.encoding.encoder_path = write(
            dir.path(),
            "encoder.json",
            r#"{"layers":[{"weights":[[1.0,0.0],[1.0,0.0]],"bias":[0.0,0.0]}]}"#,
        );
        settings.encoding.classifier_path = write(
            dir.path(),
            "gru.json",
            r#"{"units":1,"kernel":[[0.0,0.0,1.0]],"recurrent_kernel":[[0.0,0.0,0.0]],"bias":[0.0,0.0,0.0],"head":{"weights":[[1.0]],"bias":[0.0],"activation":"sigmoid"}}"#,
        );
        assert!(matches!(
            PipelineFactory::create(&settings),
            Err(AppError::ModelShape(_))
        ));
    }

    #[test]
    fn malformed_artifact_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.detection.model_path = write(dir.path(), "mlp.json", "not json");
        assert!(matches!(
            PipelineFactory::create(&settings),
            Err(AppError::ModelParse { .. })
        ));
    }
}
