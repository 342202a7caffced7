pub mod outcome_logger;
pub mod run_segment;

pub use outcome_logger::OutcomeLogger;
pub use run_segment::{Outcome, RunSegment};
