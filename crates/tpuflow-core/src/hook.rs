//! Post-install hook

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the operator's post-install command
#[async_trait]
pub trait HookRunner: Send + Sync {
    /// Run `command` with the logical name and zone as its two arguments
    async fn run(&self, command: &str, name: &str, zone: &str) -> Result<()>;
}

/// Runs the hook through `sh -c`, with the terminal attached
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellHookRunner;

#[async_trait]
impl HookRunner for ShellHookRunner {
    async fn run(&self, command: &str, name: &str, zone: &str) -> Result<()> {
        // Arguments go through "$@" so names never need quoting
        let script = format!("{} \"$@\"", command);
        tracing::debug!("Running hook: sh -c '{}' sh {} {}", script, name, zone);

        let status = Command::new("sh")
            .arg("-c")
            .arg(&script)
            .arg("sh")
            .arg(name)
            .arg(zone)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| CoreError::Hook {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(CoreError::Hook {
                command: command.to_string(),
                reason: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}
