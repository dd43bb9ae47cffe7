use std::path::PathBuf;
use thiserror::Error;
use tpuflow_cloud::CloudError;
use tpuflow_ssh::SshError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("TPU '{0}' is not in the record table")]
    NotFound(String),

    #[error("TPU '{name}' is recorded in {zone} but no longer exists there")]
    Vanished { name: String, zone: String },

    #[error("No TPU could be created in the {} zone(s) tried: {}", zones.len(), zones.join(", "))]
    ZonesExhausted { zones: Vec<String> },

    #[error("None of the recorded TPUs could be restarted")]
    NothingActionable,

    #[error(
        "TPU '{name}' was created in {zone} but could not be recorded in {}: {source}.\n\
         Add it there by hand or delete it with gcloud",
        path.display()
    )]
    Unrecorded {
        name: String,
        zone: String,
        path: PathBuf,
        source: CloudError,
    },

    #[error("Install payload {} not found.\nSet `setup_script` in the config file", path.display())]
    MissingPayload { path: PathBuf },

    #[error("Install payload failed on {name}: {reason}.\nRetry with `tpu reinstall {name}`")]
    Install { name: String, reason: String },

    #[error("Post-install hook `{command}` failed: {reason}")]
    Hook { command: String, reason: String },

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error(transparent)]
    Config(#[from] tpuflow_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
