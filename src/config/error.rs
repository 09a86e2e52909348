use thiserror::Error;

use crate::bbox::BboxError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid bbox: {0}")]
    Bbox(#[from] BboxError),
    #[error("inversion_command must name a program")]
    EmptyCommand,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
