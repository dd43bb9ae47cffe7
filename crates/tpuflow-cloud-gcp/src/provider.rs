//! Google Cloud TPU provider implementation

use crate::gcloud::{Gcloud, TpuNode};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tpuflow_cloud::{CloudError, CreateRequest, RemoteShell, RemoteSummary, TpuProvider};

/// TPU VM provider backed by the gcloud CLI
pub struct GcpTpuProvider {
    gcloud: Gcloud,
}

impl GcpTpuProvider {
    pub fn new(project: Option<String>) -> Self {
        Self {
            gcloud: Gcloud::new(project),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.gcloud = self.gcloud.with_timeout(timeout);
        self
    }

    pub fn from_gcloud(gcloud: Gcloud) -> Self {
        Self { gcloud }
    }

    pub fn gcloud(&self) -> &Gcloud {
        &self.gcloud
    }
}

impl From<TpuNode> for RemoteSummary {
    fn from(node: TpuNode) -> Self {
        Self {
            name: node.short_name().to_string(),
            address: node.external_ip(),
            state: node.state,
            accelerator_type: node.accelerator_type.clone(),
            full_name: node.name,
        }
    }
}

#[async_trait]
impl TpuProvider for GcpTpuProvider {
    async fn project(&self) -> tpuflow_cloud::Result<Option<String>> {
        if let Some(project) = self.gcloud.project() {
            return Ok(Some(project.to_string()));
        }
        Ok(self.gcloud.active_project().await?)
    }

    async fn list(&self, zone: &str) -> tpuflow_cloud::Result<Vec<RemoteSummary>> {
        let nodes = self
            .gcloud
            .list_nodes(zone)
            .await
            .map_err(|e| CloudError::Probe {
                zone: zone.to_string(),
                reason: e.to_string(),
            })?;

        Ok(nodes.into_iter().map(RemoteSummary::from).collect())
    }

    async fn create(&self, request: &CreateRequest) -> tpuflow_cloud::Result<()> {
        tracing::info!("Creating TPU {} in {}", request.name, request.zone);

        self.gcloud
            .create_node(
                &request.name,
                &request.zone,
                &request.accelerator_type,
                &request.software_version,
            )
            .await
            .map_err(|e| CloudError::ZoneUnavailable {
                zone: request.zone.clone(),
                reason: e.to_string(),
            })
    }

    async fn start(&self, name: &str, zone: &str) -> tpuflow_cloud::Result<()> {
        tracing::info!("Starting TPU {} in {}", name, zone);
        Ok(self.gcloud.start_node(name, zone).await?)
    }

    async fn stop(&self, name: &str, zone: &str) -> tpuflow_cloud::Result<()> {
        tracing::info!("Stopping TPU {} in {}", name, zone);
        Ok(self.gcloud.stop_node(name, zone).await?)
    }

    async fn delete(&self, name: &str, zone: &str) -> tpuflow_cloud::Result<()> {
        tracing::info!("Deleting TPU {} in {}", name, zone);
        Ok(self.gcloud.delete_node(name, zone).await?)
    }
}

#[async_trait]
impl RemoteShell for GcpTpuProvider {
    async fn copy_to(
        &self,
        name: &str,
        zone: &str,
        local: &Path,
        remote: &str,
    ) -> tpuflow_cloud::Result<()> {
        Ok(self.gcloud.scp(name, zone, local, remote).await?)
    }

    async fn run(&self, name: &str, zone: &str, command: &str) -> tpuflow_cloud::Result<()> {
        Ok(self.gcloud.ssh(name, zone, command).await?)
    }
}
