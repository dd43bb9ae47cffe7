mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use context::Context;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tpu")]
#[command(
    about = "Get a Cloud TPU VM in whichever zone has capacity, and keep SSH pointed at it",
    long_about = None
)]
struct Cli {
    /// Config file (otherwise TPUFLOW_CONFIG, ~/.config/tpuflow/config.json, ~/.tpuflow-config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the record table (otherwise TPUFLOW_STATE_DIR or the data dir)
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a TPU VM in the first zone with capacity
    Create {
        /// Accelerator type
        #[arg(long = "type", default_value = "v5litepod-8")]
        accelerator_type: String,
        /// TPU software version
        #[arg(long = "version", default_value = "v2-alpha-tpuv5-lite")]
        software_version: String,
        /// Only try this zone
        #[arg(long)]
        zone: Option<String>,
    },
    /// Start a recorded TPU VM (the first one that can be started if no name is given)
    Restart {
        /// Logical name, e.g. tpu-vm-us-east5-a
        name: Option<String>,
    },
    /// Stop a recorded TPU VM (the first running one if no name is given)
    Stop {
        /// Logical name
        name: Option<String>,
    },
    /// Run the install script, SSH update and hook again on a recorded TPU VM
    Reinstall {
        /// Logical name
        name: String,
    },
    /// List recorded TPU VMs
    Ls {
        /// Also query the current state and address of each one
        #[arg(short, long)]
        details: bool,
    },
    /// Delete a recorded TPU VM
    Rm {
        /// Logical name
        name: String,
    },
    /// Show the effective configuration
    PrintConfig,
    /// Drop known_hosts entries carrying the keys a host presents now
    CleanupSshHosts {
        /// SSH alias (every recorded TPU VM if omitted)
        name: Option<String>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout is for operator output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Config and records are only loaded by commands that use them
    let load = || Context::load(cli.config.as_deref(), cli.state_dir.clone());

    match cli.command {
        Commands::Create {
            ref accelerator_type,
            ref software_version,
            ref zone,
        } => {
            commands::create::handle(&load()?, accelerator_type, software_version, zone.as_deref())
                .await?;
        }
        Commands::Restart { ref name } => {
            commands::restart::handle(&load()?, name.as_deref()).await?;
        }
        Commands::Stop { ref name } => {
            commands::stop::handle(&load()?, name.as_deref()).await?;
        }
        Commands::Reinstall { ref name } => {
            commands::reinstall::handle(&load()?, name).await?;
        }
        Commands::Ls { details } => {
            commands::ls::handle(&load()?, details).await?;
        }
        Commands::Rm { ref name } => {
            commands::rm::handle(&load()?, name).await?;
        }
        Commands::PrintConfig => {
            commands::print_config::handle(&load()?).await?;
        }
        Commands::CleanupSshHosts { ref name } => {
            commands::cleanup::handle(&load()?, name.as_deref()).await?;
        }
        Commands::Version => {
            println!("tpuflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_defaults() {
        let cli = Cli::parse_from(["tpu", "create"]);
        match cli.command {
            Commands::Create {
                accelerator_type,
                software_version,
                zone,
            } => {
                assert_eq!(accelerator_type, "v5litepod-8");
                assert_eq!(software_version, "v2-alpha-tpuv5-lite");
                assert_eq!(zone, None);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tpu", "rm", "tpu-vm-a", "--state-dir", "/tmp/s", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/s")));
        assert!(matches!(cli.command, Commands::Rm { ref name } if name == "tpu-vm-a"));
    }
}
