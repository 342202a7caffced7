use super::dense::{forward_stack, validate_stack, DenseLayer};
use super::{load_json, FeatureClassifier};
use crate::error::AppError;
use crate::pipeline::types::FeatureVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feed-forward classifier over the physics feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    layers: Vec<DenseLayer>,
}

impl MlpClassifier {
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, AppError> {
        let classifier = Self { layers };
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let classifier: Self = load_json(path)?;
        classifier.validate()?;
        Ok(classifier)
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_stack(&self.layers, "mlp")?;
        let input = self.layers[0].input_dim();
        let output = self.layers[self.layers.len() - 1].output_dim();
        if input != 3 || output != 1 {
            return Err(AppError::ModelShape(format!(
                "mlp must map 3 features to 1 probability, got {input} -> {output}"
            )));
        }
        Ok(())
    }
}

impl FeatureClassifier for MlpClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<f32, AppError> {
        let output = forward_stack(&self.layers, features)?;
        Ok(output[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dense::Activation;
    use std::io::Write;

    fn single_layer(weights: [f32; 3], bias: f32) -> DenseLayer {
        DenseLayer {
            weights: weights.iter().map(|w| vec![*w]).collect(),
            bias: vec![bias],
            activation: Activation::Sigmoid,
        }
    }

    #[test]
    fn predicts_sigmoid_probability() {
        let mlp = MlpClassifier::new(vec![single_layer([0.0, 0.0, 0.0], 0.0)]).unwrap();
        assert_eq!(mlp.predict(&[0.3, 0.1, 0.0]).unwrap(), 0.5);
    }

    #[test]
    fn closer_threat_scores_higher() {
        // Negative weight on distance_x: smaller distance -> larger logit.
        let mlp = MlpClassifier::new(vec![single_layer([-8.0, 0.0, 0.0], 2.0)]).unwrap();
        let near = mlp.predict(&[0.05, 0.0, 0.0]).unwrap();
        let far = mlp.predict(&[1.0, 0.0, 0.0]).unwrap();
        assert!(near > 0.78);
        assert!(far < 0.1);
    }

    #[test]
    fn rejects_wrong_arity() {
        let layer = DenseLayer {
            weights: vec![vec![1.0], vec![1.0]],
            bias: vec![0.0],
            activation: Activation::Sigmoid,
        };
        assert!(MlpClassifier::new(vec![layer]).is_err());
    }

    #[test]
    fn loads_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"layers":[{{"weights":[[1.0,0.0],[0.0,1.0],[0.0,0.0]],"bias":[0.0,0.0],"activation":"relu"}},{{"weights":[[1.0],[1.0]],"bias":[0.0],"activation":"sigmoid"}}]}}"#
        )
        .unwrap();
        let mlp = MlpClassifier::load(file.path()).unwrap();
        assert_eq!(mlp.predict(&[0.0, 0.0, 5.0]).unwrap(), 0.5);
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let result = MlpClassifier::load(Path::new("/no/such/model.json"));
        assert!(matches!(result, Err(AppError::ModelIo { .. })));
    }
}
