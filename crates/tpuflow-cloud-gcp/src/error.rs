//! gcloud provider error types

use thiserror::Error;
use tpuflow_cloud::CloudError;

#[derive(Error, Debug)]
pub enum GcloudError {
    #[error("gcloud not found. Please install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install")]
    GcloudNotFound,

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GcloudError>;

impl From<GcloudError> for CloudError {
    fn from(e: GcloudError) -> Self {
        match e {
            GcloudError::Timeout { .. } => CloudError::Timeout(e.to_string()),
            GcloudError::IoError(io) => CloudError::Io(io),
            GcloudError::JsonError(json) => CloudError::Json(json),
            other => CloudError::CommandFailed(other.to_string()),
        }
    }
}
