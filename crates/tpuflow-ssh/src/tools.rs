//! OpenSSH client tools
//!
//! `ssh -G` resolves an alias exactly as the client would (Include, Match,
//! defaults). `ssh-keyscan` fetches the keys a host currently presents.

use crate::error::{Result, SshError};
use crate::known_hosts::{KnownHostEntry, parse_entries};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const DEFAULT_PORT: u16 = 22;
const KEY_TYPES: &str = "rsa,ecdsa,ed25519";
/// Slack on top of ssh-keyscan's own per-host timeout
const KEYSCAN_GRACE: Duration = Duration::from_secs(5);
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Effective connection target of an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub hostname: String,
    pub port: u16,
}

impl ResolvedHost {
    /// Host field as it appears in `known_hosts` (`[host]:port` off port 22)
    pub fn known_hosts_pattern(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.hostname.clone()
        } else {
            format!("[{}]:{}", self.hostname, self.port)
        }
    }
}

/// SSH tooling used by the trust synchronizer
#[async_trait]
pub trait SshTools: Send + Sync {
    /// Resolve an alias to its effective hostname and port
    async fn resolve(&self, alias: &str) -> Result<ResolvedHost>;

    /// Keys the host presents right now; empty when it does not answer
    async fn scan_keys(&self, host: &ResolvedHost) -> Result<Vec<KnownHostEntry>>;
}

/// [`SshTools`] backed by the installed OpenSSH client
#[derive(Debug, Clone)]
pub struct OpenSsh {
    ssh: String,
    keyscan: String,
    config_file: Option<PathBuf>,
    keyscan_timeout: Duration,
}

impl OpenSsh {
    pub fn new(keyscan_timeout: Duration) -> Self {
        Self {
            ssh: "ssh".to_string(),
            keyscan: "ssh-keyscan".to_string(),
            config_file: None,
            keyscan_timeout,
        }
    }

    /// Resolve against this file instead of `~/.ssh/config` (`ssh -F`)
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    pub fn with_programs(mut self, ssh: impl Into<String>, keyscan: impl Into<String>) -> Self {
        self.ssh = ssh.into();
        self.keyscan = keyscan.into();
        self
    }

    async fn output(
        &self,
        program: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<std::process::Output> {
        let command_line = format!("{} {}", program, args.join(" "));
        tracing::debug!("Running: {}", command_line);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(SshError::CommandFailed {
                command: command_line,
                reason: e.to_string(),
            }),
            Err(_) => Err(SshError::Timeout {
                command: command_line,
                secs: limit.as_secs(),
            }),
        }
    }
}

/// Pull `hostname` and `port` out of `ssh -G` output
pub fn parse_ssh_g(output: &str) -> Option<ResolvedHost> {
    let mut hostname = None;
    let mut port = DEFAULT_PORT;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "hostname" => hostname = Some(value.trim().to_string()),
            "port" => port = value.trim().parse().unwrap_or(DEFAULT_PORT),
            _ => {}
        }
    }

    hostname
        .filter(|h| !h.is_empty())
        .map(|hostname| ResolvedHost { hostname, port })
}

#[async_trait]
impl SshTools for OpenSsh {
    async fn resolve(&self, alias: &str) -> Result<ResolvedHost> {
        let mut args = Vec::new();
        if let Some(ref config) = self.config_file {
            args.push("-F".to_string());
            args.push(config.to_string_lossy().to_string());
        }
        args.push("-G".to_string());
        args.push(alias.to_string());

        let output = self
            .output(&self.ssh, &args, RESOLVE_TIMEOUT)
            .await
            .map_err(|e| SshError::UnresolvedHost {
                alias: alias.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SshError::UnresolvedHost {
                alias: alias.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        parse_ssh_g(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            SshError::UnresolvedHost {
                alias: alias.to_string(),
                reason: "no hostname in `ssh -G` output".to_string(),
            }
        })
    }

    async fn scan_keys(&self, host: &ResolvedHost) -> Result<Vec<KnownHostEntry>> {
        let secs = self.keyscan_timeout.as_secs().max(1);
        let args = vec![
            "-T".to_string(),
            secs.to_string(),
            "-p".to_string(),
            host.port.to_string(),
            "-t".to_string(),
            KEY_TYPES.to_string(),
            host.hostname.clone(),
        ];

        let output = self
            .output(
                &self.keyscan,
                &args,
                Duration::from_secs(secs) + KEYSCAN_GRACE,
            )
            .await?;

        let keys = parse_entries(&String::from_utf8_lossy(&output.stdout));
        if keys.is_empty() {
            tracing::debug!(
                "ssh-keyscan returned no keys for {} ({})",
                host.known_hosts_pattern(),
                output.status
            );
        }
        Ok(keys)
    }
}
