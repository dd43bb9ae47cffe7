//! Remote state probe
//!
//! Read-only queries against the provider. Nothing here is cached: every
//! answer is a fresh snapshot taken at the moment of use.

use crate::error::{CloudError, Result};
use crate::provider::{InstanceState, RemoteInstanceState, RemoteSummary, TpuProvider};
use std::collections::HashMap;

pub struct RemoteStateProbe<'a> {
    provider: &'a dyn TpuProvider,
}

impl<'a> RemoteStateProbe<'a> {
    pub fn new(provider: &'a dyn TpuProvider) -> Self {
        Self { provider }
    }

    /// One listing call for the zone
    pub async fn list_in_zone(&self, zone: &str) -> Result<Vec<RemoteSummary>> {
        self.provider.list(zone).await.map_err(|e| match e {
            probe @ CloudError::Probe { .. } => probe,
            other => CloudError::Probe {
                zone: zone.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Current state of `name` in `zone`; `NotFound` when nothing matches
    pub async fn state_of(&self, name: &str, zone: &str) -> Result<RemoteInstanceState> {
        let listing = self.list_in_zone(zone).await?;
        let state = find(&listing, name)
            .map(RemoteInstanceState::from)
            .unwrap_or_else(RemoteInstanceState::not_found);

        tracing::debug!("{} in {}: {}", name, zone, state.state);
        Ok(state)
    }

    /// External address of a ready instance
    pub async fn address_of(&self, name: &str, zone: &str) -> Result<String> {
        let snapshot = self.state_of(name, zone).await?;
        match snapshot {
            RemoteInstanceState {
                state: InstanceState::Ready,
                address: Some(address),
            } => Ok(address),
            other => Err(CloudError::NoAddress {
                name: name.to_string(),
                state: other.state.to_string(),
            }),
        }
    }

    /// States of several names sharing a zone, from a single listing
    pub async fn states_in_zone(
        &self,
        zone: &str,
        names: &[&str],
    ) -> Result<HashMap<String, RemoteInstanceState>> {
        let listing = self.list_in_zone(zone).await?;
        Ok(names
            .iter()
            .map(|name| {
                let state = find(&listing, name)
                    .map(RemoteInstanceState::from)
                    .unwrap_or_else(RemoteInstanceState::not_found);
                (name.to_string(), state)
            })
            .collect())
    }
}

/// Exact match on the trailing path segment. `tpu-vm-a` never matches
/// `my-tpu-vm-a` or `tpu-vm-a2`.
fn find<'l>(listing: &'l [RemoteSummary], name: &str) -> Option<&'l RemoteSummary> {
    listing
        .iter()
        .find(|s| s.name.rsplit('/').next() == Some(name))
}
