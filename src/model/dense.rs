use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
        }
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Fully connected layer. `weights` is laid out `[input][output]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    pub fn input_dim(&self) -> usize {
        self.weights.len()
    }

    pub fn output_dim(&self) -> usize {
        self.bias.len()
    }

    pub fn validate(&self, name: &str) -> Result<(), AppError> {
        if self.weights.is_empty() {
            return Err(AppError::ModelShape(format!("{name}: layer has no inputs")));
        }
        if let Some(row) = self.weights.iter().position(|row| row.len() != self.bias.len()) {
            return Err(AppError::ModelShape(format!(
                "{name}: weight row {row} has {} columns, bias has {}",
                self.weights[row].len(),
                self.bias.len()
            )));
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>, AppError> {
        if input.len() != self.input_dim() {
            return Err(AppError::ModelShape(format!(
                "dense layer expects {} inputs, got {}",
                self.input_dim(),
                input.len()
            )));
        }
        let mut output = matvec(input, &self.weights, self.output_dim());
        for (value, bias) in output.iter_mut().zip(&self.bias) {
            *value = self.activation.apply(*value + bias);
        }
        Ok(output)
    }
}

/// `input · weights` for a `[input][output]` matrix.
pub fn matvec(input: &[f32], weights: &[Vec<f32>], output_dim: usize) -> Vec<f32> {
    let mut output = vec![0.0; output_dim];
    for (x, row) in input.iter().zip(weights) {
        if *x == 0.0 {
            continue;
        }
        for (out, w) in output.iter_mut().zip(row) {
            *out += x * w;
        }
    }
    output
}

/// Runs `input` through each layer in turn.
pub fn forward_stack(layers: &[DenseLayer], input: &[f32]) -> Result<Vec<f32>, AppError> {
    let mut activations = input.to_vec();
    for layer in layers {
        activations = layer.forward(&activations)?;
    }
    Ok(activations)
}

/// Checks every layer and that adjacent layers agree on width.
pub fn validate_stack(layers: &[DenseLayer], name: &str) -> Result<(), AppError> {
    if layers.is_empty() {
        return Err(AppError::ModelShape(format!("{name}: no layers")));
    }
    for (index, layer) in layers.iter().enumerate() {
        layer.validate(&format!("{name} layer {index}"))?;
    }
    for (index, pair) in layers.windows(2).enumerate() {
        if pair[0].output_dim() != pair[1].input_dim() {
            return Err(AppError::ModelShape(format!(
                "{name}: layer {index} outputs {} values but layer {} takes {}",
                pair[0].output_dim(),
                index + 1,
                pair[1].input_dim()
            )));
        }
    }
    Ok(())
}
