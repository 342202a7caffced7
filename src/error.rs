use std::path::PathBuf;
use thiserror::Error;

pub const SCREEN_RECORDING_HINT: &str = "Check the Screen Recording permission for this terminal \
     (System Settings > Privacy & Security > Screen & System Audio Recording).";

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to start input listener: {0}")]
    InputListener(String),
    #[error("Unrecognised key event: {0}")]
    UnknownKey(String),
    #[error("Screen capture failed: {0}. {hint}", hint = SCREEN_RECORDING_HINT)]
    Capture(String),
    #[error("Failed to read model artifact {path}: {source}")]
    ModelIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse model artifact {path}: {source}")]
    ModelParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model shape mismatch: {0}")]
    ModelShape(String),
    #[error("Detection failed: {0}")]
    Detection(String),
    #[error("Decision input does not match the {0} decision engine")]
    DecisionInputMismatch(&'static str),
    #[error("Failed to actuate key: {0}")]
    Actuator(String),
    #[error("Failed to write log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Control loop task failed: {0}")]
    Task(String),
}
