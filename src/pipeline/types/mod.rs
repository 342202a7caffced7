mod decision_input;
mod detection;
mod frame;

pub use decision_input::{DecisionInput, FeatureVector, LatentVector};
pub use detection::{BoundingBox, Detection, DetectionResult, Point};
pub use frame::Frame;
