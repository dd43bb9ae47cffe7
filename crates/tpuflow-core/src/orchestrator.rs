//! Provisioning orchestrator
//!
//! Per logical instance:
//!
//! ```text
//! absent ──create──> creating ──> ready <──restart/stop──> stopped ──rm──> absent
//!                 (any state) ──probe failure──> unknown
//! ```
//!
//! The record table is persisted as soon as a creation succeeds, before any
//! further step, so a later failure cannot lose track of a billable instance.

use crate::error::{CoreError, Result};
use crate::event::{Event, Reporter};
use crate::hook::HookRunner;
use crate::install::InstallPayload;
use std::collections::HashMap;
use tpuflow_cloud::{
    CloudError, CreateRequest, InstanceRecord, InstanceState, RecordStore, RemoteInstanceState,
    RemoteShell, RemoteStateProbe, TpuProvider, candidate_zones,
};
use tpuflow_config::Config;
use tpuflow_ssh::{PruneReport, TrustReport, TrustSync};

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created {
        name: String,
        zone: String,
        trust: Option<TrustReport>,
    },
    /// The logical name already exists in the zone; nothing was done
    AlreadyExists {
        name: String,
        zone: String,
        state: InstanceState,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestartOutcome {
    AlreadyReady {
        name: String,
        address: String,
    },
    /// Transitional or unrecognised state; no start call was made
    NotStartable {
        name: String,
        state: InstanceState,
    },
    Restarted {
        name: String,
        zone: String,
        /// `None` when the address could not be read after the start
        address: Option<String>,
        trust: Option<TrustReport>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { name: String, zone: String },
    NotRunning { name: String, state: InstanceState },
    NothingReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { name: String, zone: String },
    NotInRecords { name: String },
}

/// One row of `ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub name: String,
    pub zone: String,
    pub accelerator_type: String,
    /// Only filled in with details
    pub remote: Option<RemoteInstanceState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub pruned: Vec<(String, PruneReport)>,
    pub failed: Vec<(String, String)>,
}

/// Drives the provider, the record store and the trust synchronizer
pub struct Orchestrator<'a> {
    provider: &'a dyn TpuProvider,
    shell: &'a dyn RemoteShell,
    trust: &'a dyn TrustSync,
    hook: &'a dyn HookRunner,
    reporter: &'a dyn Reporter,
    store: &'a RecordStore,
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        provider: &'a dyn TpuProvider,
        shell: &'a dyn RemoteShell,
        trust: &'a dyn TrustSync,
        hook: &'a dyn HookRunner,
        reporter: &'a dyn Reporter,
        store: &'a RecordStore,
        config: &'a Config,
    ) -> Self {
        Self {
            provider,
            shell,
            trust,
            hook,
            reporter,
            store,
            config,
        }
    }

    fn probe(&self) -> RemoteStateProbe<'a> {
        RemoteStateProbe::new(self.provider)
    }

    fn emit(&self, event: Event) {
        self.reporter.report(event);
    }

    /// Zone of a recorded instance
    async fn recorded_zone(&self, name: &str) -> Result<String> {
        let table = self.store.load().await?;
        table
            .get(name)
            .map(|record| record.zone.clone())
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    /// Create a TPU VM in the first zone that accepts it
    pub async fn create(
        &self,
        accelerator_type: &str,
        software_version: &str,
        zone: Option<&str>,
    ) -> Result<CreateOutcome> {
        let payload = InstallPayload::from_config(self.config)?;

        let mut table = self.store.load().await?;
        if !table.is_empty() {
            self.emit(Event::RecordsPresent { count: table.len() });
        }

        let zones = candidate_zones(zone, self.config.zones.as_deref());
        let probe = self.probe();

        for zone in &zones {
            let name = self.config.tpu_name(zone);
            self.emit(Event::TryingZone {
                name: name.clone(),
                zone: zone.clone(),
            });

            match probe.state_of(&name, zone).await {
                Ok(snapshot) if snapshot.state.exists() => {
                    self.emit(Event::AlreadyExists {
                        name: name.clone(),
                        zone: zone.clone(),
                        state: snapshot.state,
                    });
                    return Ok(CreateOutcome::AlreadyExists {
                        name,
                        zone: zone.clone(),
                        state: snapshot.state,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", zone, e);
                    self.emit(Event::ZoneFailed {
                        zone: zone.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }

            let request = CreateRequest {
                name: name.clone(),
                zone: zone.clone(),
                accelerator_type: accelerator_type.to_string(),
                software_version: software_version.to_string(),
            };
            if let Err(e) = self.provider.create(&request).await {
                tracing::warn!("Skipping {}: {}", zone, e);
                self.emit(Event::ZoneFailed {
                    zone: zone.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            self.emit(Event::Created {
                name: name.clone(),
                zone: zone.clone(),
            });

            table.insert(name.clone(), InstanceRecord::new(accelerator_type, zone.clone()));
            self.store
                .save(&table)
                .await
                .map_err(|source| CoreError::Unrecorded {
                    name: name.clone(),
                    zone: zone.clone(),
                    path: self.store.path().to_path_buf(),
                    source,
                })?;
            self.emit(Event::RecordSaved {
                name: name.clone(),
                path: self.store.path().to_path_buf(),
            });

            let trust = self.provision(&payload, &name, zone).await?;
            self.emit(Event::Done { name: name.clone() });

            return Ok(CreateOutcome::Created {
                name,
                zone: zone.clone(),
                trust,
            });
        }

        Err(CoreError::ZonesExhausted { zones })
    }

    /// Install, trust sync, hook
    async fn provision(
        &self,
        payload: &InstallPayload,
        name: &str,
        zone: &str,
    ) -> Result<Option<TrustReport>> {
        self.emit(Event::CopyingPayload {
            name: name.to_string(),
            path: payload.local().to_path_buf(),
        });
        payload.copy(self.shell, name, zone).await?;

        self.emit(Event::RunningPayload {
            name: name.to_string(),
        });
        payload.run(self.shell, name, zone).await?;

        let trust = self.sync_trust(name, zone).await;

        if let Some(ref command) = self.config.extra_startup_script {
            self.emit(Event::RunningHook {
                command: command.clone(),
            });
            self.hook.run(command, name, zone).await?;
        }
        Ok(trust)
    }

    /// Point the trust state at the current address. Failures are reported,
    /// not raised: the instance itself is fine at this point.
    async fn sync_trust(&self, name: &str, zone: &str) -> Option<TrustReport> {
        let address = match self.probe().address_of(name, zone).await {
            Ok(address) => address,
            Err(e) => {
                self.emit(Event::TrustSyncFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                return None;
            }
        };
        self.sync_trust_to(name, &address).await
    }

    async fn sync_trust_to(&self, name: &str, address: &str) -> Option<TrustReport> {
        match self.trust.sync(name, address).await {
            Ok(report) => {
                self.emit(Event::TrustSynced {
                    name: name.to_string(),
                    address: address.to_string(),
                    report: report.clone(),
                });
                Some(report)
            }
            Err(e) => {
                tracing::warn!("Trust sync for {} failed: {}", name, e);
                self.emit(Event::TrustSyncFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Start a recorded TPU VM, or the first recorded one that can be started
    pub async fn restart(&self, name: Option<&str>) -> Result<RestartOutcome> {
        if let Some(name) = name {
            let zone = self.recorded_zone(name).await?;
            return self.restart_one(name, &zone).await;
        }

        let table = self.store.load().await?;
        for (name, record) in table.iter() {
            match self.restart_one(name, &record.zone).await {
                Ok(RestartOutcome::NotStartable { .. }) => {}
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    self.emit(Event::Skipped {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Err(CoreError::NothingActionable)
    }

    /// Errors are only returned before the start call, so a bulk restart
    /// never moves on after it has started something.
    async fn restart_one(&self, name: &str, zone: &str) -> Result<RestartOutcome> {
        self.emit(Event::Checking {
            name: name.to_string(),
            zone: zone.to_string(),
        });

        let snapshot = self.probe().state_of(name, zone).await?;
        match snapshot {
            RemoteInstanceState {
                state: InstanceState::Ready,
                address: Some(address),
            } => {
                self.emit(Event::AlreadyReady {
                    name: name.to_string(),
                    address: address.clone(),
                });
                return Ok(RestartOutcome::AlreadyReady {
                    name: name.to_string(),
                    address,
                });
            }
            RemoteInstanceState {
                state: InstanceState::Ready,
                address: None,
            } => {
                return Err(CloudError::NoAddress {
                    name: name.to_string(),
                    state: InstanceState::Ready.to_string(),
                }
                .into());
            }
            RemoteInstanceState {
                state: InstanceState::NotFound,
                ..
            } => {
                return Err(CoreError::Vanished {
                    name: name.to_string(),
                    zone: zone.to_string(),
                });
            }
            RemoteInstanceState { state, .. } if !state.can_start() => {
                self.emit(Event::NotStartable {
                    name: name.to_string(),
                    state,
                });
                return Ok(RestartOutcome::NotStartable {
                    name: name.to_string(),
                    state,
                });
            }
            _ => {}
        }

        self.emit(Event::Starting {
            name: name.to_string(),
            zone: zone.to_string(),
        });
        self.provider.start(name, zone).await?;

        let (address, trust) = match self.probe().address_of(name, zone).await {
            Ok(address) => {
                let trust = self.sync_trust_to(name, &address).await;
                (Some(address), trust)
            }
            Err(e) => {
                self.emit(Event::TrustSyncFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                (None, None)
            }
        };
        self.emit(Event::Done {
            name: name.to_string(),
        });

        Ok(RestartOutcome::Restarted {
            name: name.to_string(),
            zone: zone.to_string(),
            address,
            trust,
        })
    }

    /// Stop a recorded TPU VM, or the first recorded one that is running
    pub async fn stop(&self, name: Option<&str>) -> Result<StopOutcome> {
        if let Some(name) = name {
            let zone = self.recorded_zone(name).await?;
            return self.stop_one(name, &zone).await;
        }

        let table = self.store.load().await?;
        for (name, record) in table.iter() {
            match self.stop_one(name, &record.zone).await {
                Ok(StopOutcome::NotRunning { .. }) => {}
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    self.emit(Event::Skipped {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.emit(Event::NothingReady);
        Ok(StopOutcome::NothingReady)
    }

    async fn stop_one(&self, name: &str, zone: &str) -> Result<StopOutcome> {
        self.emit(Event::Checking {
            name: name.to_string(),
            zone: zone.to_string(),
        });

        let snapshot = self.probe().state_of(name, zone).await?;
        if !snapshot.state.is_ready() {
            self.emit(Event::NotRunning {
                name: name.to_string(),
                state: snapshot.state,
            });
            return Ok(StopOutcome::NotRunning {
                name: name.to_string(),
                state: snapshot.state,
            });
        }

        self.emit(Event::Stopping {
            name: name.to_string(),
            zone: zone.to_string(),
        });
        self.provider.stop(name, zone).await?;
        self.emit(Event::Stopped {
            name: name.to_string(),
        });

        Ok(StopOutcome::Stopped {
            name: name.to_string(),
            zone: zone.to_string(),
        })
    }

    /// Re-run install, trust sync and hook on a recorded TPU VM
    pub async fn reinstall(&self, name: &str) -> Result<Option<TrustReport>> {
        let zone = self.recorded_zone(name).await?;
        let payload = InstallPayload::from_config(self.config)?;

        let trust = self.provision(&payload, name, &zone).await?;
        self.emit(Event::Done {
            name: name.to_string(),
        });
        Ok(trust)
    }

    /// Delete a recorded TPU VM and forget it
    pub async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let mut table = self.store.load().await?;
        let Some(record) = table.get(name) else {
            self.emit(Event::NotInRecords {
                name: name.to_string(),
            });
            return Ok(DeleteOutcome::NotInRecords {
                name: name.to_string(),
            });
        };
        let zone = record.zone.clone();

        self.emit(Event::Deleting {
            name: name.to_string(),
            zone: zone.clone(),
        });
        self.provider.delete(name, &zone).await?;

        table.remove(name);
        self.store.save(&table).await?;
        self.emit(Event::Deleted {
            name: name.to_string(),
        });
        self.emit(Event::DiskReminder);

        Ok(DeleteOutcome::Deleted {
            name: name.to_string(),
            zone,
        })
    }

    /// Recorded TPU VMs, with their remote state when `details` is set.
    /// One listing call per distinct zone; a failed listing shows `Unknown`.
    pub async fn list(&self, details: bool) -> Result<Vec<ListRow>> {
        let table = self.store.load().await?;

        let mut remote: HashMap<String, RemoteInstanceState> = HashMap::new();
        if details {
            let mut by_zone: Vec<(&str, Vec<&str>)> = Vec::new();
            for (name, record) in table.iter() {
                match by_zone.iter().position(|(zone, _)| *zone == record.zone) {
                    Some(i) => by_zone[i].1.push(name.as_str()),
                    None => by_zone.push((record.zone.as_str(), vec![name.as_str()])),
                }
            }

            let probe = self.probe();
            for (zone, names) in by_zone {
                match probe.states_in_zone(zone, &names).await {
                    Ok(states) => remote.extend(states),
                    Err(e) => {
                        tracing::warn!("{}", e);
                        remote.extend(
                            names
                                .iter()
                                .map(|n| (n.to_string(), RemoteInstanceState::unknown())),
                        );
                    }
                }
            }
        }

        Ok(table
            .iter()
            .map(|(name, record)| ListRow {
                name: name.clone(),
                zone: record.zone.clone(),
                accelerator_type: record.accelerator_type.clone(),
                remote: remote.remove(name.as_str()),
            })
            .collect())
    }

    /// Prune stale host keys for one alias, or for every recorded name
    pub async fn cleanup_ssh_hosts(&self, name: Option<&str>) -> Result<CleanupSummary> {
        let mut summary = CleanupSummary::default();

        if let Some(name) = name {
            let report = self.trust.prune(name).await?;
            self.emit(Event::Pruned {
                name: name.to_string(),
                report: report.clone(),
            });
            summary.pruned.push((name.to_string(), report));
            return Ok(summary);
        }

        let table = self.store.load().await?;
        for name in table.names() {
            match self.trust.prune(name).await {
                Ok(report) => {
                    self.emit(Event::Pruned {
                        name: name.clone(),
                        report: report.clone(),
                    });
                    summary.pruned.push((name.clone(), report));
                }
                Err(e) => {
                    self.emit(Event::PruneFailed {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                    summary.failed.push((name.clone(), e.to_string()));
                }
            }
        }
        Ok(summary)
    }
}
