//! Trust synchronizer error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("Could not resolve SSH host '{alias}': {reason}")]
    UnresolvedHost { alias: String, reason: String },

    #[error("`{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not match the expected content after rewrite")]
    Verify { path: PathBuf },

    #[error(
        "{error}; restoring {path} from {backup} also failed: {restore_error}. \
        Copy the backup back manually"
    )]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        error: String,
        restore_error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SshError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SshError::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SshError>;
