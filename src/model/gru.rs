use super::dense::{matvec, sigmoid, DenseLayer};
use super::{load_json, SequenceClassifier};
use crate::error::AppError;
use crate::pipeline::types::LatentVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// GRU bias, either one shared vector or separate input/recurrent rows
/// (`reset_after` layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GruBias {
    Shared(Vec<f32>),
    Split(Vec<Vec<f32>>),
}

/// Single GRU layer followed by a dense probability head.
///
/// Gate columns follow the `[update, reset, candidate]` order. `kernel` is
/// `[input][3 * units]`, `recurrent_kernel` is `[units][3 * units]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GruClassifier {
    units: usize,
    kernel: Vec<Vec<f32>>,
    recurrent_kernel: Vec<Vec<f32>>,
    bias: GruBias,
    head: DenseLayer,
}

impl GruClassifier {
    pub fn new(
        units: usize,
        kernel: Vec<Vec<f32>>,
        recurrent_kernel: Vec<Vec<f32>>,
        bias: GruBias,
        head: DenseLayer,
    ) -> Result<Self, AppError> {
        let classifier = Self {
            units,
            kernel,
            recurrent_kernel,
            bias,
            head,
        };
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let classifier: Self = load_json(path)?;
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.len()
    }

    fn validate(&self) -> Result<(), AppError> {
        let gates = 3 * self.units;
        if self.units == 0 || self.kernel.is_empty() {
            return Err(AppError::ModelShape("gru: empty layer".to_string()));
        }
        if self.kernel.iter().any(|row| row.len() != gates) {
            return Err(AppError::ModelShape(format!(
                "gru: kernel rows must have {gates} columns"
            )));
        }
        if self.recurrent_kernel.len() != self.units
            || self.recurrent_kernel.iter().any(|row| row.len() != gates)
        {
            return Err(AppError::ModelShape(format!(
                "gru: recurrent kernel must be {}x{gates}",
                self.units
            )));
        }
        let bias_ok = match &self.bias {
            GruBias::Shared(bias) => bias.len() == gates,
            GruBias::Split(rows) => rows.len() == 2 && rows.iter().all(|row| row.len() == gates),
        };
        if !bias_ok {
            return Err(AppError::ModelShape("gru: bias has the wrong shape".to_string()));
        }
        self.head.validate("gru head")?;
        if self.head.input_dim() != self.units || self.head.output_dim() != 1 {
            return Err(AppError::ModelShape(format!(
                "gru head must map {} units to 1 probability",
                self.units
            )));
        }
        Ok(())
    }

    fn step(&self, x: &[f32], h: &[f32]) -> Vec<f32> {
        let units = self.units;
        let gates = 3 * units;
        let x_proj = matvec(x, &self.kernel, gates);
        let h_proj = matvec(h, &self.recurrent_kernel, gates);
        let (input_bias, recurrent_bias): (&[f32], Option<&[f32]>) = match &self.bias {
            GruBias::Shared(bias) => (bias.as_slice(), None),
            GruBias::Split(rows) => (rows[0].as_slice(), Some(rows[1].as_slice())),
        };
        let gate = |offset: usize, j: usize| {
            x_proj[offset + j]
                + input_bias[offset + j]
                + h_proj[offset + j]
                + recurrent_bias.map_or(0.0, |b| b[offset + j])
        };

        let update: Vec<f32> = (0..units).map(|j| sigmoid(gate(0, j))).collect();
        let reset: Vec<f32> = (0..units).map(|j| sigmoid(gate(units, j))).collect();
        let candidate_recurrent: Vec<f32> = match recurrent_bias {
            // reset applied after the recurrent projection
            Some(b) => (0..units)
                .map(|j| reset[j] * (h_proj[2 * units + j] + b[2 * units + j]))
                .collect(),
            None => {
                let reset_h: Vec<f32> = h.iter().zip(&reset).map(|(h, r)| h * r).collect();
                let projected = matvec(&reset_h, &self.recurrent_kernel, gates);
                projected[2 * units..].to_vec()
            }
        };

        (0..units)
            .map(|j| {
                let candidate =
                    (x_proj[2 * units + j] + input_bias[2 * units + j] + candidate_recurrent[j]).tanh();
                update[j] * h[j] + (1.0 - update[j]) * candidate
            })
            .collect()
    }
}

impl SequenceClassifier for GruClassifier {
    fn predict(&self, sequence: &[LatentVector]) -> Result<f32, AppError> {
        let mut h = vec![0.0; self.units];
        for (t, z) in sequence.iter().enumerate() {
            if z.len() != self.input_dim() {
                return Err(AppError::ModelShape(format!(
                    "gru expects {}-dim latents, step {t} has {}",
                    self.input_dim(),
                    z.len()
                )));
            }
            h = self.step(z.values(), &h);
        }
        let output = self.head.forward(&h)?;
        Ok(output[0])
    }
}
