pub mod debounce;
pub mod run_controller;

pub use debounce::Debouncer;
pub use run_controller::{ControlEvent, ControlKeys, ResumeReset, RunController, RunState};
