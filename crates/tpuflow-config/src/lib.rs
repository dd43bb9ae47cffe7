pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "TPUFLOW_CONFIG";
pub const STATE_DIR_ENV: &str = "TPUFLOW_STATE_DIR";

const DEFAULT_PREFIX: &str = "tpu-vm-";
const DEFAULT_SETUP_SCRIPT: &str = "setup.sh";
const DEFAULT_KEYSCAN_TIMEOUT_SECS: u64 = 5;

/// tpuflow settings
///
/// Every key is optional; unknown keys are ignored so the same file can be
/// shared with other tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical names are `<prefix><zone>`
    pub tpu_name_prefix: String,

    /// Command run after installation with `<name> <zone>` as arguments
    pub extra_startup_script: Option<String>,

    /// Written as `IdentityFile` into new SSH alias blocks
    pub ssh_identity_file: Option<String>,

    /// Overrides the built-in zone priority list
    pub zones: Option<Vec<String>>,

    /// Install payload copied to and run on every new TPU VM
    pub setup_script: PathBuf,

    /// gcloud project; gcloud's active project when absent
    pub project: Option<String>,

    /// Upper bound for every gcloud invocation
    pub command_timeout_secs: Option<u64>,

    pub ssh_keyscan_timeout_secs: u64,

    /// Append freshly scanned host keys after pruning
    pub ssh_accept_new_host_keys: bool,

    /// Defaults to `~/.ssh/config`
    pub ssh_config_file: Option<PathBuf>,

    /// Defaults to `~/.ssh/known_hosts`
    pub known_hosts_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tpu_name_prefix: DEFAULT_PREFIX.to_string(),
            extra_startup_script: None,
            ssh_identity_file: None,
            zones: None,
            setup_script: PathBuf::from(DEFAULT_SETUP_SCRIPT),
            project: None,
            command_timeout_secs: None,
            ssh_keyscan_timeout_secs: DEFAULT_KEYSCAN_TIMEOUT_SECS,
            ssh_accept_new_host_keys: false,
            ssh_config_file: None,
            known_hosts_file: None,
        }
    }
}

impl Config {
    /// Logical name of the TPU VM in `zone`
    pub fn tpu_name(&self, zone: &str) -> String {
        format!("{}{}", self.tpu_name_prefix, zone)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn keyscan_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_keyscan_timeout_secs)
    }

    pub fn ssh_config_path(&self) -> Result<PathBuf> {
        match self.ssh_config_file {
            Some(ref path) => expand_tilde(path),
            None => Ok(ssh_dir()?.join("config")),
        }
    }

    pub fn known_hosts_path(&self) -> Result<PathBuf> {
        match self.known_hosts_file {
            Some(ref path) => expand_tilde(path),
            None => Ok(ssh_dir()?.join("known_hosts")),
        }
    }

    pub fn setup_script_path(&self) -> Result<PathBuf> {
        expand_tilde(&self.setup_script)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A loaded configuration and where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when defaults are in use
    pub source: Option<PathBuf>,
}

/// Load the configuration.
///
/// An explicit path wins over the search order of [`find_config_file`].
/// A missing file is not an error: defaults are used and a warning logged.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => Some(expand_tilde(path)?),
        None => find_config_file(),
    };

    match path {
        Some(path) if path.exists() => {
            let config = Config::from_file(&path)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(LoadedConfig {
                config,
                source: Some(path),
            })
        }
        other => {
            let shown = other
                .or_else(|| config_candidates().into_iter().next())
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no config path>".to_string());
            tracing::warn!("Config file not found at {}, using default values", shown);
            Ok(LoadedConfig {
                config: Config::default(),
                source: None,
            })
        }
    }
}

/// Config file locations, in priority order:
/// 1. `TPUFLOW_CONFIG` environment variable
/// 2. `~/.config/tpuflow/config.json` (platform config dir)
/// 3. `~/.tpuflow-config.json`
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("tpuflow").join("config.json"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".tpuflow-config.json"));
    }
    candidates
}

/// First existing config file, if any
pub fn find_config_file() -> Option<PathBuf> {
    config_candidates().into_iter().find(|p| p.exists())
}

/// Directory holding the record table
///
/// `TPUFLOW_STATE_DIR`, otherwise `<data dir>/tpuflow`.
pub fn get_state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        if !dir.is_empty() {
            return expand_tilde(Path::new(&dir));
        }
    }
    dirs::data_dir()
        .map(|d| d.join("tpuflow"))
        .ok_or(ConfigError::DataDirNotFound)
}

fn ssh_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".ssh"))
        .ok_or(ConfigError::HomeDirNotFound)
}

/// Expand a leading `~/`
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}
