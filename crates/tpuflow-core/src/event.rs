//! Progress events
//!
//! The orchestrator never prints. Every step is emitted as an [`Event`] and
//! the front end decides how to show it.

use std::path::PathBuf;
use tpuflow_cloud::InstanceState;
use tpuflow_ssh::{PruneReport, TrustReport};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The record table already has entries when creating
    RecordsPresent { count: usize },
    TryingZone { name: String, zone: String },
    AlreadyExists { name: String, zone: String, state: InstanceState },
    ZoneFailed { zone: String, reason: String },
    Created { name: String, zone: String },
    RecordSaved { name: String, path: PathBuf },
    CopyingPayload { name: String, path: PathBuf },
    RunningPayload { name: String },
    TrustSynced { name: String, address: String, report: TrustReport },
    TrustSyncFailed { name: String, reason: String },
    RunningHook { command: String },
    Checking { name: String, zone: String },
    AlreadyReady { name: String, address: String },
    Starting { name: String, zone: String },
    /// Neither ready nor in a state a start call applies to
    NotStartable { name: String, state: InstanceState },
    /// A record was passed over while looking for an actionable one
    Skipped { name: String, reason: String },
    Stopping { name: String, zone: String },
    Stopped { name: String },
    NotRunning { name: String, state: InstanceState },
    NothingReady,
    NotInRecords { name: String },
    Deleting { name: String, zone: String },
    Deleted { name: String },
    /// Deleting compute does not delete detachable disks
    DiskReminder,
    Pruned { name: String, report: PruneReport },
    PruneFailed { name: String, reason: String },
    Done { name: String },
}

/// Sink for [`Event`]s
pub trait Reporter: Send + Sync {
    fn report(&self, event: Event);
}
