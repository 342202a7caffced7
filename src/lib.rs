//! Perception-action autopilot for a side-scrolling boss fight.
//!
//! A single-threaded loop reads the held control keys, grabs the newest
//! frame, turns it into a decision input (physics features from object
//! detections, or a window of frame encodings), scores it and presses the
//! jump key when the score clears the variant's threshold.

pub mod capture;
pub mod clock;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod journal;
pub mod model;
pub mod pipeline;

pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder, LoopControl};
pub use error::AppError;
