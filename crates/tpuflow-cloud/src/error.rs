//! Cloud layer error types

use std::path::PathBuf;
use thiserror::Error;

/// Cloud layer errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider command failed: {0}")]
    CommandFailed(String),

    #[error("Remote query failed in zone {zone}: {reason}")]
    Probe { zone: String, reason: String },

    #[error("Creation failed in zone {zone}: {reason}")]
    ZoneUnavailable { zone: String, reason: String },

    #[error("TPU {name} has no external address (state: {state})")]
    NoAddress { name: String, state: String },

    #[error("Record file {path} is corrupt: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
