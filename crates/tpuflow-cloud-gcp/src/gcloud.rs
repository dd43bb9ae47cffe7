//! gcloud CLI wrapper
//!
//! Wraps the `gcloud compute tpus tpu-vm` commands. Every query asks for
//! `--format=json` and is parsed into typed structs; nothing is scraped from
//! human-readable output.

use crate::error::{GcloudError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tpuflow_cloud::InstanceState;

/// gcloud CLI wrapper
#[derive(Debug, Clone)]
pub struct Gcloud {
    program: String,
    project: Option<String>,
    timeout: Option<Duration>,
}

impl Gcloud {
    pub fn new(project: Option<String>) -> Self {
        Self {
            program: "gcloud".to_string(),
            project,
            timeout: None,
        }
    }

    /// Use a different executable (absolute path or name on `PATH`)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound every invocation; the child is killed when the limit is hit
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Locate the gcloud executable
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| GcloudError::GcloudNotFound)
    }

    /// Build `compute tpus tpu-vm <verb> ...` arguments
    fn tpu_vm_args(&self, verb: &str, rest: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = ["compute", "tpus", "tpu-vm", verb]
            .iter()
            .chain(rest.iter())
            .map(|s| s.to_string())
            .collect();

        if let Some(ref project) = self.project {
            args.push("--project".to_string());
            args.push(project.clone());
        }
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    fn display(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Run a gcloud command and return stdout
    async fn run_command(&self, args: &[String]) -> Result<String> {
        let command_line = self.display(args);
        tracing::debug!("Running: {}", command_line);

        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = self.bounded(&command_line, cmd.output()).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GcloudError::CommandFailed {
                command: command_line,
                stderr: summarize(&stderr),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a gcloud command with the terminal attached (install output is
    /// shown to the operator as it happens)
    async fn run_interactive(&self, args: &[String]) -> Result<()> {
        let command_line = self.display(args);
        tracing::debug!("Running (interactive): {}", command_line);

        let mut cmd = self.command(args);
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = self.bounded(&command_line, cmd.status()).await?;

        if !status.success() {
            return Err(GcloudError::CommandFailed {
                command: command_line,
                stderr: format!("exited with {}", status),
            });
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        command_line: &str,
        fut: impl std::future::Future<Output = std::io::Result<T>>,
    ) -> Result<T> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| GcloudError::Timeout {
                    command: command_line.to_string(),
                    secs: limit.as_secs(),
                })?,
            None => fut.await,
        };

        result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GcloudError::GcloudNotFound
            } else {
                GcloudError::IoError(e)
            }
        })
    }

    /// Active project of the gcloud configuration
    pub async fn active_project(&self) -> Result<Option<String>> {
        let args: Vec<String> = ["config", "get-value", "project", "--format=json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = self.run_command(&args).await?;

        if output.trim().is_empty() {
            return Ok(None);
        }
        let project: Option<String> = serde_json::from_str(output.trim())?;
        Ok(project.filter(|p| !p.is_empty()))
    }

    /// List all TPU VMs in a zone
    pub async fn list_nodes(&self, zone: &str) -> Result<Vec<TpuNode>> {
        let args = self.tpu_vm_args("list", &["--zone", zone, "--format=json"]);
        let output = self.run_command(&args).await?;

        if output.trim().is_empty() || output.trim() == "[]" {
            return Ok(Vec::new());
        }

        let nodes: Vec<TpuNode> = serde_json::from_str(&output)?;
        Ok(nodes)
    }

    /// Create a TPU VM
    pub async fn create_node(
        &self,
        name: &str,
        zone: &str,
        accelerator_type: &str,
        version: &str,
    ) -> Result<()> {
        let accelerator = format!("--accelerator-type={}", accelerator_type);
        let version = format!("--version={}", version);
        let args = self.tpu_vm_args(
            "create",
            &[name, "--zone", zone, accelerator.as_str(), version.as_str()],
        );
        self.run_command(&args).await?;
        Ok(())
    }

    /// Start a TPU VM
    pub async fn start_node(&self, name: &str, zone: &str) -> Result<()> {
        let args = self.tpu_vm_args("start", &[name, "--zone", zone]);
        self.run_command(&args).await?;
        Ok(())
    }

    /// Stop a TPU VM
    pub async fn stop_node(&self, name: &str, zone: &str) -> Result<()> {
        let args = self.tpu_vm_args("stop", &[name, "--zone", zone]);
        self.run_command(&args).await?;
        Ok(())
    }

    /// Delete a TPU VM without prompting
    pub async fn delete_node(&self, name: &str, zone: &str) -> Result<()> {
        let args = self.tpu_vm_args("delete", &[name, "--zone", zone, "--quiet"]);
        self.run_command(&args).await?;
        Ok(())
    }

    /// Copy a local file to the TPU VM
    pub async fn scp(&self, name: &str, zone: &str, local: &Path, remote: &str) -> Result<()> {
        let local = local.to_string_lossy();
        let target = format!("{}:{}", name, remote);
        let args = self.tpu_vm_args("scp", &["--zone", zone, local.as_ref(), target.as_str()]);
        self.run_interactive(&args).await
    }

    /// Run a command on the TPU VM
    pub async fn ssh(&self, name: &str, zone: &str, command: &str) -> Result<()> {
        let args = self.tpu_vm_args("ssh", &[name, "--zone", zone, "--command", command]);
        self.run_interactive(&args).await
    }
}

/// Keep the last meaningful line of gcloud's stderr (the actual error)
fn summarize(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("no error output")
        .to_string()
}

fn unknown_state() -> InstanceState {
    InstanceState::Unknown
}

/// TPU node as returned by `gcloud compute tpus tpu-vm list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpuNode {
    /// Fully qualified name: `projects/<p>/locations/<zone>/nodes/<name>`
    pub name: String,

    #[serde(default = "unknown_state")]
    pub state: InstanceState,

    pub accelerator_type: Option<String>,

    #[serde(default)]
    pub network_endpoints: Vec<NetworkEndpoint>,
}

impl TpuNode {
    /// Trailing path segment of the fully qualified name
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// First external address over all network endpoints
    pub fn external_ip(&self) -> Option<String> {
        self.network_endpoints
            .iter()
            .find_map(|e| e.access_config.as_ref()?.external_ip.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEndpoint {
    pub ip_address: Option<String>,
    pub access_config: Option<AccessConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    pub external_ip: Option<String>,
}
