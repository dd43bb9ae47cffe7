//! Google Cloud TPU provider for tpuflow
//!
//! This crate implements the `TpuProvider` and `RemoteShell` traits on top of
//! the `gcloud compute tpus tpu-vm` command group.
//!
//! # Requirements
//!
//! - `gcloud` CLI must be installed and configured
//! - Authentication is managed through gcloud configuration
//!
//! # Example
//!
//! ```ignore
//! use tpuflow_cloud::{RemoteStateProbe, TpuProvider};
//! use tpuflow_cloud_gcp::GcpTpuProvider;
//!
//! let provider = GcpTpuProvider::new(None);
//! let probe = RemoteStateProbe::new(&provider);
//! let state = probe.state_of("tpu-vm-us-east5-a", "us-east5-a").await?;
//! ```

pub mod error;
pub mod gcloud;
pub mod provider;

pub use error::{GcloudError, Result};
pub use gcloud::{Gcloud, TpuNode};
pub use provider::GcpTpuProvider;
