//! Perception and decision capabilities.
//!
//! The control loop only sees the traits below. The built-in implementations
//! load their weights from JSON artifacts exported next to the trained
//! models.

pub mod color_detector;
pub mod dense;
pub mod encoder;
pub mod gru;
pub mod mlp;

use crate::error::AppError;
use crate::pipeline::types::{Detection, FeatureVector, Frame, LatentVector};
use serde::de::DeserializeOwned;
use std::path::Path;

pub use color_detector::ColorBlobDetector;
pub use encoder::DenseEncoder;
pub use gru::GruClassifier;
pub use mlp::MlpClassifier;

pub trait Detector {
    /// Every detection at or above `confidence_threshold`.
    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>, AppError>;
}

pub trait Encoder {
    /// Number of preprocessed pixels expected by `encode`.
    fn input_len(&self) -> usize;
    fn latent_dim(&self) -> usize;
    fn encode(&self, pixels: &[f32]) -> Result<LatentVector, AppError>;
}

pub trait FeatureClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<f32, AppError>;
}

pub trait SequenceClassifier {
    /// `sequence` is ordered oldest to newest.
    fn predict(&self, sequence: &[LatentVector]) -> Result<f32, AppError>;
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::ModelIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| AppError::ModelParse {
        path: path.to_path_buf(),
        source,
    })
}
