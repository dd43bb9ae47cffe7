//! `~/.ssh/config` alias blocks
//!
//! Only the `HostName` line of the matching block is ever rewritten. Every
//! other byte of the file, comments and line endings included, is kept.

use crate::backup::{read_or_empty, write_atomic};
use crate::error::Result;
use std::path::Path;

/// Alias block written for a TPU VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub address: String,
    pub user: String,
    pub identity_file: Option<String>,
}

impl AliasEntry {
    fn render(&self) -> String {
        let mut block = format!(
            "Host {}\n  HostName {}\n  User {}\n",
            self.name, self.address, self.user
        );
        if let Some(ref identity) = self.identity_file {
            block.push_str(&format!("  IdentityFile {}\n", identity));
        }
        block
    }
}

/// What `upsert` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasChange {
    /// `HostName` rewritten in the existing block
    Updated { previous: String },
    /// Existing block had no `HostName`; one was inserted
    HostNameInserted,
    /// A new block was appended
    Appended,
    /// Block already pointed at the address
    Unchanged,
}

impl AliasChange {
    pub fn is_change(&self) -> bool {
        !matches!(self, AliasChange::Unchanged)
    }
}

/// Split `line` into its lowercased keyword and value.
/// Accepts both `Keyword value` and `Keyword=value`.
fn keyword(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let end = trimmed
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(trimmed.len());
    let (key, rest) = trimmed.split_at(end);
    let value = rest
        .trim_start()
        .strip_prefix('=')
        .unwrap_or(rest)
        .trim();
    Some((key.to_ascii_lowercase(), value))
}

fn starts_block(line: &str) -> bool {
    matches!(keyword(line), Some((k, _)) if k == "host" || k == "match")
}

fn host_matches(line: &str, name: &str) -> bool {
    match keyword(line) {
        Some((k, value)) if k == "host" => value
            .split_whitespace()
            .any(|pattern| pattern.trim_matches('"') == name),
        _ => false,
    }
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// `HostName` of the block for `name`, if any
pub fn lookup(contents: &str, name: &str) -> Option<String> {
    let mut in_block = false;
    for line in contents.lines() {
        if starts_block(line) {
            in_block = host_matches(line, name);
            continue;
        }
        if in_block {
            if let Some((k, value)) = keyword(line) {
                if k == "hostname" {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Point the alias block for `entry.name` at `entry.address`
pub fn upsert(contents: &str, entry: &AliasEntry) -> (String, AliasChange) {
    let mut lines: Vec<String> = contents.split_inclusive('\n').map(str::to_string).collect();

    let Some(host_idx) = lines.iter().position(|l| host_matches(l, &entry.name)) else {
        let mut out = contents.to_string();
        if !out.is_empty() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            if !out.ends_with("\n\n") {
                out.push('\n');
            }
        }
        out.push_str(&entry.render());
        return (out, AliasChange::Appended);
    };

    let block_end = lines[host_idx + 1..]
        .iter()
        .position(|l| starts_block(l))
        .map(|p| host_idx + 1 + p)
        .unwrap_or(lines.len());

    for idx in host_idx + 1..block_end {
        let Some((k, value)) = keyword(&lines[idx]) else {
            continue;
        };
        if k != "hostname" {
            continue;
        }
        if value == entry.address {
            return (contents.to_string(), AliasChange::Unchanged);
        }

        let previous = value.to_string();
        let line = &lines[idx];
        let trimmed = line.trim_start();
        let key_len = trimmed
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(trimmed.len());
        let rewritten = format!(
            "{}{} {}{}",
            indentation(line),
            &trimmed[..key_len],
            entry.address,
            line_ending(line)
        );
        lines[idx] = rewritten;
        return (lines.concat(), AliasChange::Updated { previous });
    }

    // Block without HostName: insert right below the Host line
    let indent = lines[host_idx + 1..block_end]
        .iter()
        .find(|l| keyword(l).is_some())
        .map(|l| indentation(l).to_string())
        .unwrap_or_else(|| "  ".to_string());
    let eol = match line_ending(&lines[host_idx]) {
        "" => {
            lines[host_idx].push('\n');
            "\n"
        }
        eol => eol,
    }
    .to_string();
    lines.insert(
        host_idx + 1,
        format!("{}HostName {}{}", indent, entry.address, eol),
    );
    (lines.concat(), AliasChange::HostNameInserted)
}

/// [`upsert`] applied to a file. The file is only written when it changes.
pub fn upsert_file(path: &Path, entry: &AliasEntry) -> Result<AliasChange> {
    let contents = read_or_empty(path)?;
    let (updated, change) = upsert(&contents, entry);

    if change.is_change() {
        write_atomic(path, &updated)?;
        tracing::debug!("Updated alias {} in {}", entry.name, path.display());
    }
    Ok(change)
}
