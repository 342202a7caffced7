use std::sync::Arc;

/// Encoder output for one frame. Cloning shares the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentVector(Arc<[f32]>);

impl LatentVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized `[distance_x, distance_y, velocity]`.
pub type FeatureVector = [f32; 3];

/// What a perception pipeline hands to the decision engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionInput {
    Features(FeatureVector),
    /// Oldest to newest.
    Sequence(Vec<LatentVector>),
}
