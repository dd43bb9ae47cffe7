use crate::output::ConsoleReporter;
use std::path::{Path, PathBuf};
use tpuflow_cloud::RecordStore;
use tpuflow_cloud_gcp::GcpTpuProvider;
use tpuflow_config::{Config, expand_tilde, get_state_dir};
use tpuflow_core::{Orchestrator, ShellHookRunner};
use tpuflow_ssh::{OpenSsh, TrustSynchronizer};

/// Everything a command needs, built once per invocation
pub struct Context {
    pub config: Config,
    pub config_source: Option<PathBuf>,
    pub store: RecordStore,
    pub provider: GcpTpuProvider,
    pub trust: TrustSynchronizer<OpenSsh>,
}

impl Context {
    pub fn load(config_path: Option<&Path>, state_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let loaded = tpuflow_config::load(config_path)?;
        let config = loaded.config;

        let state_dir = match state_dir {
            Some(dir) => expand_tilde(&dir)?,
            None => get_state_dir()?,
        };
        let store = RecordStore::in_dir(&state_dir);
        tracing::debug!("Record table: {}", store.path().display());

        let provider =
            GcpTpuProvider::new(config.project.clone()).with_timeout(config.command_timeout());

        let ssh_config = config.ssh_config_path()?;
        let tools = OpenSsh::new(config.keyscan_timeout()).with_config_file(
            config
                .ssh_config_file
                .as_ref()
                .map(|_| ssh_config.clone()),
        );
        let trust = TrustSynchronizer::new(tools, ssh_config, config.known_hosts_path()?)
            .with_identity_file(config.ssh_identity_file.clone())
            .with_accept_new_keys(config.ssh_accept_new_host_keys);

        Ok(Self {
            config,
            config_source: loaded.source,
            store,
            provider,
            trust,
        })
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(
            &self.provider,
            &self.provider,
            &self.trust,
            &ShellHookRunner,
            &ConsoleReporter,
            &self.store,
            &self.config,
        )
    }
}
