//! Trust synchronizer
//!
//! Keeps the SSH alias of a TPU VM pointed at its current address and drops
//! `known_hosts` entries carrying the keys that address presents now.

use crate::alias::{self, AliasChange, AliasEntry};
use crate::backup::{BackupGuard, read_or_empty, write_atomic};
use crate::error::{Result, SshError};
use crate::known_hosts;
use crate::tools::{ResolvedHost, SshTools};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Outcome of one prune-and-rescan pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// Resolved `hostname` / `[hostname]:port`
    pub host: String,
    pub removed_hosts: Vec<String>,
    pub removed_lines: usize,
    pub added_lines: usize,
    /// Backup written before the rewrite, if the store existed
    pub backup: Option<PathBuf>,
}

impl PruneReport {
    pub fn changed(&self) -> bool {
        self.removed_lines > 0 || self.added_lines > 0
    }
}

/// Outcome of a full trust sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustReport {
    pub alias: AliasChange,
    pub prune: PruneReport,
}

/// Trust-state updates the orchestrator depends on
#[async_trait]
pub trait TrustSync: Send + Sync {
    /// Point the alias at `address`, then prune and rescan
    async fn sync(&self, name: &str, address: &str) -> Result<TrustReport>;

    /// Prune and rescan without touching the alias table
    async fn prune(&self, alias: &str) -> Result<PruneReport>;
}

#[derive(Debug, Default)]
struct Rewrite {
    removed_hosts: Vec<String>,
    removed_lines: usize,
    added_lines: usize,
}

/// Synchronizer over an alias table and a host-key store
pub struct TrustSynchronizer<T: SshTools> {
    tools: T,
    ssh_config: PathBuf,
    known_hosts: PathBuf,
    user: String,
    identity_file: Option<String>,
    accept_new_keys: bool,
}

impl<T: SshTools> TrustSynchronizer<T> {
    pub fn new(tools: T, ssh_config: PathBuf, known_hosts: PathBuf) -> Self {
        Self {
            tools,
            ssh_config,
            known_hosts,
            user: whoami::username(),
            identity_file: None,
            accept_new_keys: false,
        }
    }

    pub fn with_identity_file(mut self, identity_file: Option<String>) -> Self {
        self.identity_file = identity_file;
        self
    }

    /// Append the scanned keys after pruning
    pub fn with_accept_new_keys(mut self, accept: bool) -> Self {
        self.accept_new_keys = accept;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn ssh_config(&self) -> &Path {
        &self.ssh_config
    }

    pub fn known_hosts(&self) -> &Path {
        &self.known_hosts
    }

    pub fn upsert_alias(&self, name: &str, address: &str) -> Result<AliasChange> {
        let entry = AliasEntry {
            name: name.to_string(),
            address: address.to_string(),
            user: self.user.clone(),
            identity_file: self.identity_file.clone(),
        };
        let change = alias::upsert_file(&self.ssh_config, &entry)?;

        match change {
            AliasChange::Updated { ref previous } => {
                tracing::info!("Alias {}: {} -> {}", name, previous, address)
            }
            AliasChange::Appended | AliasChange::HostNameInserted => {
                tracing::info!("Alias {} -> {}", name, address)
            }
            AliasChange::Unchanged => tracing::debug!("Alias {} already at {}", name, address),
        }
        Ok(change)
    }

    pub async fn prune_and_rescan(&self, alias: &str) -> Result<PruneReport> {
        let host = self.tools.resolve(alias).await?;
        let guard = BackupGuard::create(&self.known_hosts)?;
        let backup = guard.backup().map(Path::to_path_buf);

        match self.rewrite(&host).await {
            Ok(rewrite) => {
                guard.commit();
                Ok(PruneReport {
                    host: host.known_hosts_pattern(),
                    removed_hosts: rewrite.removed_hosts,
                    removed_lines: rewrite.removed_lines,
                    added_lines: rewrite.added_lines,
                    backup,
                })
            }
            Err(error) => {
                tracing::warn!(
                    "Trust update for {} failed, restoring {}",
                    alias,
                    self.known_hosts.display()
                );
                match guard.restore() {
                    Ok(()) => Err(error),
                    Err(restore_error) => Err(SshError::RestoreFailed {
                        path: self.known_hosts.clone(),
                        backup: backup
                            .unwrap_or_else(|| crate::backup::backup_path(&self.known_hosts)),
                        error: error.to_string(),
                        restore_error: restore_error.to_string(),
                    }),
                }
            }
        }
    }

    async fn rewrite(&self, host: &ResolvedHost) -> Result<Rewrite> {
        let keys = self.tools.scan_keys(host).await?;
        if keys.is_empty() {
            tracing::info!("No host keys from {}, known_hosts left as is", host.hostname);
            return Ok(Rewrite::default());
        }

        let contents = read_or_empty(&self.known_hosts)?;
        let pruned = known_hosts::prune(&contents, &keys);

        let (updated, added_lines) = if self.accept_new_keys {
            (known_hosts::append(&pruned.contents, &keys), keys.len())
        } else {
            (pruned.contents, 0)
        };

        if updated != contents {
            write_atomic(&self.known_hosts, &updated)?;
            if read_or_empty(&self.known_hosts)? != updated {
                return Err(SshError::Verify {
                    path: self.known_hosts.clone(),
                });
            }
        }

        Ok(Rewrite {
            removed_hosts: pruned.removed_hosts,
            removed_lines: pruned.removed_lines,
            added_lines,
        })
    }
}

#[async_trait]
impl<T: SshTools> TrustSync for TrustSynchronizer<T> {
    async fn sync(&self, name: &str, address: &str) -> Result<TrustReport> {
        let alias = self.upsert_alias(name, address)?;
        let prune = self.prune_and_rescan(name).await?;
        Ok(TrustReport { alias, prune })
    }

    async fn prune(&self, alias: &str) -> Result<PruneReport> {
        self.prune_and_rescan(alias).await
    }
}
