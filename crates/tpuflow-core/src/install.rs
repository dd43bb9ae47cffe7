//! Install payload: a local script copied to the TPU VM and run there

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tpuflow_cloud::RemoteShell;
use tpuflow_config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPayload {
    local: PathBuf,
    remote_name: String,
}

impl InstallPayload {
    /// Payload configured by `setup_script`. Fails when the file is missing,
    /// before anything remote has happened.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.setup_script_path()?)
    }

    pub fn new(local: PathBuf) -> Result<Self> {
        if !local.is_file() {
            return Err(CoreError::MissingPayload { path: local });
        }
        let remote_name = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| CoreError::MissingPayload {
                path: local.clone(),
            })?;

        Ok(Self { local, remote_name })
    }

    pub fn local(&self) -> &Path {
        &self.local
    }

    /// Command run on the instance
    pub fn command(&self) -> String {
        format!("bash {}", shell_quote(&self.remote_name))
    }

    pub async fn copy(&self, shell: &dyn RemoteShell, name: &str, zone: &str) -> Result<()> {
        shell
            .copy_to(name, zone, &self.local, &self.remote_name)
            .await
            .map_err(|e| self.failed(name, e))
    }

    pub async fn run(&self, shell: &dyn RemoteShell, name: &str, zone: &str) -> Result<()> {
        shell
            .run(name, zone, &self.command())
            .await
            .map_err(|e| self.failed(name, e))
    }

    fn failed(&self, name: &str, error: impl std::fmt::Display) -> CoreError {
        CoreError::Install {
            name: name.to_string(),
            reason: error.to_string(),
        }
    }
}

fn shell_quote(word: &str) -> String {
    let plain = word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'));
    if plain && !word.is_empty() {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
