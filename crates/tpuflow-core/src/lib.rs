//! tpuflow core
//!
//! The [`Orchestrator`] walks candidate zones until a TPU VM can be created,
//! keeps the local record table in step with what exists remotely, and hands
//! every new address to the trust synchronizer.

pub mod error;
pub mod event;
pub mod hook;
pub mod install;
pub mod orchestrator;

pub use error::{CoreError, Result};
pub use event::{Event, Reporter};
pub use hook::{HookRunner, ShellHookRunner};
pub use install::InstallPayload;
pub use orchestrator::{
    CleanupSummary, CreateOutcome, DeleteOutcome, ListRow, Orchestrator, RestartOutcome,
    StopOutcome,
};
