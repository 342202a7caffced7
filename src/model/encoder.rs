use super::dense::{forward_stack, validate_stack, DenseLayer};
use super::{load_json, Encoder};
use crate::error::AppError;
use crate::pipeline::types::LatentVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dense stack from a flattened grayscale frame to a latent vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseEncoder {
    layers: Vec<DenseLayer>,
}

impl DenseEncoder {
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, AppError> {
        validate_stack(&layers, "encoder")?;
        Ok(Self { layers })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let encoder: Self = load_json(path)?;
        validate_stack(&encoder.layers, "encoder")?;
        Ok(encoder)
    }
}

impl Encoder for DenseEncoder {
    fn input_len(&self) -> usize {
        self.layers[0].input_dim()
    }

    fn latent_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].output_dim()
    }

    fn encode(&self, pixels: &[f32]) -> Result<LatentVector, AppError> {
        Ok(LatentVector::new(forward_stack(&self.layers, pixels)?))
    }
}
