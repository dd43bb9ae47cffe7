use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    HomeDirNotFound,

    #[error(
        "Could not determine a data directory for the record table.\n\
        Set TPUFLOW_STATE_DIR or pass --state-dir"
    )]
    DataDirNotFound,

    #[error("Config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
