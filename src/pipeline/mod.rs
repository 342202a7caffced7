pub mod pipeline_factory;
pub mod services;
pub mod types;

pub use services::{ActionActuator, DecisionEngine, PerceptionPipeline};
pub use types::{DecisionInput, Frame, LatentVector};
