//! Provider trait definitions
//!
//! The provisioning API and the remote shell are external collaborators.
//! tpuflow only talks to them through these traits, so the orchestrator can be
//! driven by the gcloud implementation in production and by fakes in tests.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provisioning API abstraction
///
/// Every method maps to exactly one external call. Failures are reported as
/// errors and never retried here; the orchestrator decides what a failure
/// means (next zone, skip, abort).
#[async_trait]
pub trait TpuProvider: Send + Sync {
    /// Project the provider operates on, if one can be determined
    async fn project(&self) -> Result<Option<String>>;

    /// List all TPU VMs in a zone
    async fn list(&self, zone: &str) -> Result<Vec<RemoteSummary>>;

    /// Create a TPU VM
    async fn create(&self, request: &CreateRequest) -> Result<()>;

    /// Start a stopped TPU VM
    async fn start(&self, name: &str, zone: &str) -> Result<()>;

    /// Stop a running TPU VM
    async fn stop(&self, name: &str, zone: &str) -> Result<()>;

    /// Delete a TPU VM (attached disks are not touched)
    async fn delete(&self, name: &str, zone: &str) -> Result<()>;
}

/// Remote execution abstraction used to run the install payload
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Copy a local file to the instance (`remote` is the destination path,
    /// empty for the login directory)
    async fn copy_to(&self, name: &str, zone: &str, local: &Path, remote: &str) -> Result<()>;

    /// Run a command on the instance
    async fn run(&self, name: &str, zone: &str, command: &str) -> Result<()>;
}

/// Parameters for a creation attempt in a single zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub name: String,
    pub zone: String,
    pub accelerator_type: String,
    pub software_version: String,
}

/// One entry of a zone listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSummary {
    /// Short name (trailing path segment of the provider name)
    pub name: String,

    /// Name exactly as the provider returned it
    pub full_name: String,

    pub state: InstanceState,

    /// Current external address, if any
    pub address: Option<String>,

    pub accelerator_type: Option<String>,
}

/// Lifecycle state of a remote TPU VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Creating,
    Ready,
    Starting,
    Stopping,
    Stopped,
    Restarting,
    Reimaging,
    Repairing,
    Deleting,
    Preempted,
    Terminated,
    Suspended,
    /// No resource with that name exists in the zone
    #[serde(skip_deserializing)]
    NotFound,
    /// Unrecognised provider state, or the query itself failed
    #[serde(other)]
    Unknown,
}

impl InstanceState {
    pub fn is_ready(self) -> bool {
        self == InstanceState::Ready
    }

    /// Whether a start call can bring the instance up. Transitional and
    /// unrecognised states are left alone.
    pub fn can_start(self) -> bool {
        matches!(
            self,
            InstanceState::Stopped | InstanceState::Suspended | InstanceState::Preempted
        )
    }

    /// Whether a resource with this state exists remotely
    pub fn exists(self) -> bool {
        !matches!(self, InstanceState::NotFound)
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceState::Creating => "creating",
            InstanceState::Ready => "ready",
            InstanceState::Starting => "starting",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Restarting => "restarting",
            InstanceState::Reimaging => "reimaging",
            InstanceState::Repairing => "repairing",
            InstanceState::Deleting => "deleting",
            InstanceState::Preempted => "preempted",
            InstanceState::Terminated => "terminated",
            InstanceState::Suspended => "suspended",
            InstanceState::NotFound => "not found",
            InstanceState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of a remote instance, re-derived on every use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInstanceState {
    pub state: InstanceState,
    pub address: Option<String>,
}

impl RemoteInstanceState {
    pub fn not_found() -> Self {
        Self {
            state: InstanceState::NotFound,
            address: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            state: InstanceState::Unknown,
            address: None,
        }
    }
}

impl From<&RemoteSummary> for RemoteInstanceState {
    fn from(summary: &RemoteSummary) -> Self {
        Self {
            state: summary.state,
            address: summary.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_provider_json() {
        let state: InstanceState = serde_json::from_str("\"READY\"").unwrap();
        assert_eq!(state, InstanceState::Ready);

        let state: InstanceState = serde_json::from_str("\"STOPPED\"").unwrap();
        assert_eq!(state, InstanceState::Stopped);
    }

    #[test]
    fn test_unrecognised_state_is_unknown() {
        let state: InstanceState = serde_json::from_str("\"HIDING\"").unwrap();
        assert_eq!(state, InstanceState::Unknown);

        // NotFound is produced locally, never by the provider
        let state: InstanceState = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(state, InstanceState::Unknown);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(InstanceState::Ready.to_string(), "ready");
        assert_eq!(InstanceState::NotFound.to_string(), "not found");
        assert!(!InstanceState::NotFound.exists());
        assert!(InstanceState::Stopped.exists());
    }

    #[test]
    fn test_can_start() {
        assert!(InstanceState::Stopped.can_start());
        assert!(InstanceState::Suspended.can_start());
        assert!(InstanceState::Preempted.can_start());
        for state in [
            InstanceState::Creating,
            InstanceState::Starting,
            InstanceState::Stopping,
            InstanceState::Deleting,
            InstanceState::Repairing,
            InstanceState::Terminated,
            InstanceState::Unknown,
        ] {
            assert!(!state.can_start(), "{state}");
        }
    }
}
