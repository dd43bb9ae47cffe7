//! tpuflow cloud layer
//!
//! This crate provides the provider abstraction used by tpuflow to manage
//! TPU VMs, together with the two pieces of state handling that sit directly
//! on top of it: the remote state probe and the local record store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   tpuflow CLI                    │
//! │      (tpu create / restart / stop / rm ...)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 tpuflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait TpuProvider / trait RemoteShell    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ State Probe  │  │ Record Store │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │  gcloud TPU   │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod error;
pub mod probe;
pub mod provider;
pub mod state;
pub mod zones;

// Re-exports
pub use error::{CloudError, Result};
pub use probe::RemoteStateProbe;
pub use provider::{
    CreateRequest, InstanceState, RemoteInstanceState, RemoteShell, RemoteSummary, TpuProvider,
};
pub use state::{InstanceRecord, RecordStore, RecordTable};
pub use zones::{DEFAULT_ZONES, candidate_zones};
