//! Terminal output

use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};
use tpuflow_core::{Event, ListRow, Reporter};
use tpuflow_ssh::{AliasChange, PruneReport};

/// Prints each event as one line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: Event) {
        println!("{}", render(&event));
    }
}

fn describe_prune(report: &PruneReport) -> String {
    let mut parts = Vec::new();
    if report.removed_lines == 0 {
        parts.push("no stale known_hosts entries".to_string());
    } else {
        parts.push(format!(
            "removed {} known_hosts line(s) for {}",
            report.removed_lines,
            report.removed_hosts.join(", ")
        ));
    }
    if report.added_lines > 0 {
        parts.push(format!("trusted {} new key(s)", report.added_lines));
    }
    if let Some(ref backup) = report.backup {
        if report.changed() {
            parts.push(format!("backup at {}", backup.display()));
        }
    }
    parts.join(", ")
}

fn describe_alias(change: &AliasChange, name: &str) -> String {
    match change {
        AliasChange::Updated { previous } => format!("alias {} moved from {}", name, previous),
        AliasChange::HostNameInserted | AliasChange::Appended => format!("alias {} added", name),
        AliasChange::Unchanged => format!("alias {} unchanged", name),
    }
}

pub fn render(event: &Event) -> String {
    match event {
        Event::RecordsPresent { count } => format!(
            "⚠ {} TPU VM(s) already recorded, `tpu restart` might be enough",
            count
        )
        .yellow()
        .to_string(),
        Event::TryingZone { name, zone } => {
            format!("\nTrying {} in {}...", name.cyan(), zone.bold())
        }
        Event::AlreadyExists { name, zone, state } => format!(
            "✓ {} already exists in {} ({}), nothing to do",
            name.cyan(),
            zone.bold(),
            state
        ),
        Event::ZoneFailed { zone, reason } => {
            format!("✗ Not available in {}: {}", zone.bold(), reason).red().to_string()
        }
        Event::Created { name, zone } => format!("✓ Created {} in {}", name.cyan(), zone.bold())
            .green()
            .to_string(),
        Event::RecordSaved { name, path } => {
            format!("  Recorded {} in {}", name, path.display()).dimmed().to_string()
        }
        Event::CopyingPayload { name, path } => {
            format!("Copying {} to {}", path.display(), name.cyan())
        }
        Event::RunningPayload { name } => format!("Running install script on {}", name.cyan()),
        Event::TrustSynced {
            name,
            address,
            report,
        } => format!(
            "✓ {} is at {}: {}, {}",
            name.cyan(),
            address.bold(),
            describe_alias(&report.alias, name),
            describe_prune(&report.prune)
        ),
        Event::TrustSyncFailed { name, reason } => format!(
            "⚠ Could not update SSH settings for {}: {}\n  Retry with `tpu cleanup-ssh-hosts {}`",
            name, reason, name
        )
        .yellow()
        .to_string(),
        Event::RunningHook { command } => format!("Running post-install hook {}", command.bold()),
        Event::Checking { name, zone } => {
            format!("\nChecking {} in {}...", name.cyan(), zone.bold())
        }
        Event::AlreadyReady { name, address } => format!(
            "✓ {} is ready at {}, nothing to do",
            name.cyan(),
            address.bold()
        )
        .green()
        .to_string(),
        Event::Starting { name, zone } => format!("Starting {} in {}...", name.cyan(), zone.bold()),
        Event::NotStartable { name, state } => format!(
            "⚠ {} is {}, not starting it. Try again once it settles",
            name, state
        )
        .yellow()
        .to_string(),
        Event::Skipped { name, reason } => {
            format!("⚠ Skipping {}: {}", name, reason).yellow().to_string()
        }
        Event::Stopping { name, zone } => format!("Stopping {} in {}...", name.cyan(), zone.bold()),
        Event::Stopped { name } => format!("✓ {} stopped", name.cyan()).green().to_string(),
        Event::NotRunning { name, state } => {
            format!("  {} is not running ({}), skipping", name, state).dimmed().to_string()
        }
        Event::NothingReady => "No running TPU VM in the record table".dimmed().to_string(),
        Event::NotInRecords { name } => format!(
            "✗ {} is not in the record table, delete it with gcloud if it exists",
            name
        )
        .yellow()
        .to_string(),
        Event::Deleting { name, zone } => format!("Deleting {} in {}...", name.cyan(), zone.bold()),
        Event::Deleted { name } => format!("✓ {} deleted", name.cyan()).green().to_string(),
        Event::DiskReminder => format!(
            "{} attached disks are not deleted with the TPU VM, check whether they need cleanup",
            "Note:".yellow().bold()
        ),
        Event::Pruned { name, report } => format!(
            "✓ {} ({}): {}",
            name.cyan(),
            report.host,
            describe_prune(report)
        ),
        Event::PruneFailed { name, reason } => {
            format!("✗ {}: {}", name, reason).red().to_string()
        }
        Event::Done { name } => format!("✓ Done! You can now use {}", name.green().bold())
            .bold()
            .to_string(),
    }
}

/// `ls` table
pub fn format_records(rows: &[ListRow], details: bool) -> String {
    if rows.is_empty() {
        return "No TPU VM recorded".to_string();
    }

    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ZONE")]
        zone: String,
        #[tabled(rename = "TYPE")]
        accelerator_type: String,
    }

    #[derive(Tabled)]
    struct RecordRowDetailed {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ZONE")]
        zone: String,
        #[tabled(rename = "TYPE")]
        accelerator_type: String,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "ADDRESS")]
        address: String,
    }

    if details {
        let rows: Vec<RecordRowDetailed> = rows
            .iter()
            .map(|r| RecordRowDetailed {
                name: r.name.clone(),
                zone: r.zone.clone(),
                accelerator_type: r.accelerator_type.clone(),
                state: r
                    .remote
                    .as_ref()
                    .map(|s| s.state.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                address: r
                    .remote
                    .as_ref()
                    .and_then(|s| s.address.clone())
                    .unwrap_or_else(|| "-".to_string()),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    } else {
        let rows: Vec<RecordRow> = rows
            .iter()
            .map(|r| RecordRow {
                name: r.name.clone(),
                zone: r.zone.clone(),
                accelerator_type: r.accelerator_type.clone(),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpuflow_cloud::{InstanceState, RemoteInstanceState};

    fn row(name: &str, remote: Option<RemoteInstanceState>) -> ListRow {
        ListRow {
            name: name.to_string(),
            zone: "us-east5-a".to_string(),
            accelerator_type: "v5litepod-8".to_string(),
            remote,
        }
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_records(&[], true), "No TPU VM recorded");
    }

    #[test]
    fn test_format_records() {
        let table = format_records(&[row("tpu-vm-us-east5-a", None)], false);
        assert!(table.contains("NAME"));
        assert!(table.contains("tpu-vm-us-east5-a"));
        assert!(!table.contains("STATE"));
    }

    #[test]
    fn test_format_records_detailed() {
        let table = format_records(
            &[
                row(
                    "tpu-vm-a",
                    Some(RemoteInstanceState {
                        state: InstanceState::Ready,
                        address: Some("10.0.0.5".to_string()),
                    }),
                ),
                row("tpu-vm-b", Some(RemoteInstanceState::unknown())),
            ],
            true,
        );
        assert!(table.contains("STATE"));
        assert!(table.contains("10.0.0.5"));
        assert!(table.contains("unknown"));
    }

    #[test]
    fn test_render_names_zone_and_reason() {
        colored::control::set_override(false);
        let line = render(&Event::ZoneFailed {
            zone: "europe-west4-b".to_string(),
            reason: "RESOURCE_EXHAUSTED".to_string(),
        });
        assert_eq!(line, "✗ Not available in europe-west4-b: RESOURCE_EXHAUSTED");
    }
}
