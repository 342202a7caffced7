use crate::error::AppError;
use crate::model::{FeatureClassifier, SequenceClassifier};
use crate::pipeline::types::DecisionInput;

/// Scores a decision input with the classifier that matches the pipeline.
/// Holds no state between calls.
pub enum DecisionEngine {
    Features(Box<dyn FeatureClassifier>),
    Sequence(Box<dyn SequenceClassifier>),
}

impl DecisionEngine {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionEngine::Features(_) => "feature-vector",
            DecisionEngine::Sequence(_) => "sequence",
        }
    }

    pub fn score(&self, input: &DecisionInput) -> Result<f32, AppError> {
        let probability = match (self, input) {
            (DecisionEngine::Features(classifier), DecisionInput::Features(features)) => {
                classifier.predict(features)?
            }
            (DecisionEngine::Sequence(classifier), DecisionInput::Sequence(sequence)) => {
                classifier.predict(sequence)?
            }
            _ => return Err(AppError::DecisionInputMismatch(self.name())),
        };
        Ok(probability.clamp(0.0, 1.0))
    }
}
