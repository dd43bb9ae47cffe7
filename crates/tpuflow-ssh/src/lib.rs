//! tpuflow SSH trust synchronizer
//!
//! TPU VMs get a new external address on every start. This crate keeps the
//! workstation side in step:
//!
//! ```text
//! sync(name, address)
//!   ├── alias      ~/.ssh/config   Host block -> HostName address
//!   └── prune      ~/.ssh/known_hosts
//!         ├── tools::resolve    ssh -G name
//!         ├── backup            known_hosts -> known_hosts.bak
//!         ├── tools::scan_keys  ssh-keyscan host
//!         └── known_hosts       drop lines with the scanned keys
//! ```

pub mod alias;
pub mod backup;
pub mod error;
pub mod known_hosts;
pub mod sync;
pub mod tools;

pub use alias::{AliasChange, AliasEntry};
pub use backup::BackupGuard;
pub use error::{Result, SshError};
pub use known_hosts::{KnownHostEntry, PruneResult};
pub use sync::{PruneReport, TrustReport, TrustSync, TrustSynchronizer};
pub use tools::{OpenSsh, ResolvedHost, SshTools};
