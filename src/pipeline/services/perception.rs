use super::detection_pipeline::DetectionPipeline;
use super::encoding_pipeline::EncodingPipeline;
use crate::config::PipelineVariant;
use crate::error::AppError;
use crate::pipeline::types::{DecisionInput, Frame};

/// The perception strategy selected at startup.
pub enum PerceptionPipeline {
    Detection(DetectionPipeline),
    Encoding(EncodingPipeline),
}

impl PerceptionPipeline {
    pub fn variant(&self) -> PipelineVariant {
        match self {
            PerceptionPipeline::Detection(_) => PipelineVariant::Detection,
            PerceptionPipeline::Encoding(_) => PipelineVariant::Encoding,
        }
    }

    /// `None` means there is nothing to decide on this iteration.
    pub fn perceive(&mut self, frame: &Frame) -> Result<Option<DecisionInput>, AppError> {
        match self {
            PerceptionPipeline::Detection(pipeline) => pipeline.process(frame).map(Some),
            PerceptionPipeline::Encoding(pipeline) => pipeline.process(frame),
        }
    }

    /// Resume-time reset: forget the previous distance or drop the window.
    pub fn reset(&mut self) {
        match self {
            PerceptionPipeline::Detection(pipeline) => pipeline.reset(),
            PerceptionPipeline::Encoding(pipeline) => pipeline.reset(),
        }
    }
}
