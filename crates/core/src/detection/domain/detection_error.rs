use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("inference runtime error: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("invalid input frame: {0}")]
    InvalidFrame(String),
}

impl DetectionError {
    /// Wraps any runtime error by message, keeping `ort` error types out of
    /// the public API.
    pub fn runtime(err: impl std::fmt::Display) -> Self {
        Self::Runtime(err.to_string())
    }
}
