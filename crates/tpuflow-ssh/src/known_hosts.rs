//! `known_hosts` parsing and pruning
//!
//! Lines are matched on key material only (key type plus base64 blob), never
//! on substrings of the host field, so unrelated hosts sharing an address
//! prefix survive.

use std::collections::HashSet;

/// One parsed `known_hosts` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHostEntry {
    /// `@cert-authority` or `@revoked`
    pub marker: Option<String>,
    /// Comma separated host patterns (possibly hashed)
    pub hosts: String,
    pub key_type: String,
    pub key: String,
    pub comment: Option<String>,
    /// The line as read, without its line ending
    pub raw: String,
}

impl KnownHostEntry {
    /// Parse a line. Comments, blank lines and lines with too few fields
    /// yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim_end_matches(['\r', '\n']);
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let mut fields = trimmed.split_whitespace();
        let mut first = fields.next()?;
        let marker = if first.starts_with('@') {
            let marker = first.to_string();
            first = fields.next()?;
            Some(marker)
        } else {
            None
        };
        let key_type = fields.next()?;
        let key = fields.next()?;
        let comment: Vec<&str> = fields.collect();

        Some(Self {
            marker,
            hosts: first.to_string(),
            key_type: key_type.to_string(),
            key: key.to_string(),
            comment: (!comment.is_empty()).then(|| comment.join(" ")),
            raw: raw.to_string(),
        })
    }

    pub fn host_patterns(&self) -> impl Iterator<Item = &str> {
        self.hosts.split(',').filter(|h| !h.is_empty())
    }

    pub fn same_key(&self, other: &KnownHostEntry) -> bool {
        self.key_type == other.key_type && self.key == other.key
    }

    /// `hosts key_type key`, the form `ssh-keyscan` prints
    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.hosts, self.key_type, self.key)
    }
}

/// Parse every entry of a `known_hosts`-formatted text
pub fn parse_entries(contents: &str) -> Vec<KnownHostEntry> {
    contents.lines().filter_map(KnownHostEntry::parse).collect()
}

/// Result of [`prune`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub contents: String,
    /// Distinct host patterns of the removed lines, in file order
    pub removed_hosts: Vec<String>,
    pub removed_lines: usize,
}

/// Remove every plain entry whose key equals one of `keys`.
///
/// Marker lines, comments, blank lines and unparseable lines are kept
/// byte-for-byte.
pub fn prune(contents: &str, keys: &[KnownHostEntry]) -> PruneResult {
    let mut result = PruneResult::default();
    let mut seen = HashSet::new();

    for line in contents.split_inclusive('\n') {
        let matched = KnownHostEntry::parse(line).filter(|entry| {
            entry.marker.is_none() && keys.iter().any(|key| key.same_key(entry))
        });

        match matched {
            Some(entry) => {
                result.removed_lines += 1;
                for host in entry.host_patterns() {
                    if seen.insert(host.to_string()) {
                        result.removed_hosts.push(host.to_string());
                    }
                }
            }
            None => result.contents.push_str(line),
        }
    }
    result
}

/// Append entries at the end of `contents`, one per line
pub fn append(contents: &str, entries: &[KnownHostEntry]) -> String {
    let mut out = contents.to_string();
    if entries.is_empty() {
        return out;
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for entry in entries {
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out
}
