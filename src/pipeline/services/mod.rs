pub mod action_actuator;
pub mod decision_engine;
pub mod detection_pipeline;
pub mod encoding_pipeline;
pub mod perception;
pub mod physics;
pub mod preprocessing;
pub mod sequence_window;

pub use action_actuator::{ActionActuator, KeyPresser, LoggingPresser};
#[cfg(feature = "desktop")]
pub use action_actuator::RdevKeyPresser;
pub use decision_engine::DecisionEngine;
pub use detection_pipeline::DetectionPipeline;
pub use encoding_pipeline::EncodingPipeline;
pub use perception::PerceptionPipeline;
pub use physics::{FeatureScale, PhysicsState};
pub use preprocessing::Preprocessor;
pub use sequence_window::SequenceWindow;
