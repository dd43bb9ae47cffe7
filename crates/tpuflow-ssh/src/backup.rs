//! Backup-then-mutate for shared trust files
//!
//! `known_hosts` also guards hosts this tool knows nothing about, so a
//! half-applied edit is worse than a stale entry. A [`BackupGuard`] copies the
//! file aside before any mutation and puts it back unless the edit is
//! explicitly committed, including when the guard is dropped early.

use crate::error::{Result, SshError};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const BACKUP_SUFFIX: &str = ".bak";
const TMP_SUFFIX: &str = ".tpuflow.tmp";
// Separate from TMP_SUFFIX so a leftover from a failed write cannot block a restore
const RESTORE_SUFFIX: &str = ".tpuflow.restore";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Path of the rolling backup for `path` (`known_hosts` -> `known_hosts.bak`)
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, BACKUP_SUFFIX)
}

/// The file an edit of `path` must land in. A symlinked `~/.ssh/config` (as
/// dotfile managers set up) resolves to the file it points at, so the rename
/// replaces that file and the link survives.
pub fn resolve_target(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(real) => Ok(real),
            // Dangling link: write where it points
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let link = fs::read_link(path).map_err(|e| SshError::file(path, e))?;
                Ok(match path.parent() {
                    Some(dir) => dir.join(link),
                    None => link,
                })
            }
            Err(e) => Err(SshError::file(path, e)),
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
/// Existing permissions are kept; missing parent directories are created.
/// Symlinks are followed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let resolved = resolve_target(path)?;
    let path = resolved.as_path();

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| SshError::file(dir, e))?;
        }
    }

    let tmp = with_suffix(path, TMP_SUFFIX);
    fs::write(&tmp, contents).map_err(|e| SshError::file(&tmp, e))?;

    if let Ok(meta) = fs::metadata(path) {
        if let Err(e) = fs::set_permissions(&tmp, meta.permissions()) {
            let _ = fs::remove_file(&tmp);
            return Err(SshError::file(&tmp, e));
        }
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(SshError::file(path, e));
    }
    Ok(())
}

/// Read a file, treating a missing file as empty
pub fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(SshError::file(path, e)),
    }
}

/// Scoped backup of a single file
#[derive(Debug)]
pub struct BackupGuard {
    target: PathBuf,
    backup: PathBuf,
    /// Whether the target existed when the guard was taken
    existed: bool,
    done: bool,
}

impl BackupGuard {
    /// Copy `target` to its `.bak` sibling. A symlinked target is backed up
    /// and restored at the file it points to.
    pub fn create(target: &Path) -> Result<Self> {
        let resolved = resolve_target(target)?;
        let target = resolved.as_path();
        let backup = backup_path(target);
        let existed = target.exists();

        if existed {
            fs::copy(target, &backup).map_err(|e| SshError::file(&backup, e))?;
            tracing::debug!("Backed up {} to {}", target.display(), backup.display());
        }

        Ok(Self {
            target: target.to_path_buf(),
            backup,
            existed,
            done: false,
        })
    }

    /// Backup file, if the target existed
    pub fn backup(&self) -> Option<&Path> {
        self.existed.then_some(self.backup.as_path())
    }

    /// Keep the mutated file. The backup copy stays on disk.
    pub fn commit(mut self) {
        self.done = true;
    }

    /// Put the original content back
    pub fn restore(mut self) -> Result<()> {
        self.done = true;
        self.restore_inner()
    }

    fn restore_inner(&self) -> Result<()> {
        if self.existed {
            let tmp = with_suffix(&self.target, RESTORE_SUFFIX);
            fs::copy(&self.backup, &tmp).map_err(|e| SshError::file(&tmp, e))?;
            if let Err(e) = fs::rename(&tmp, &self.target) {
                let _ = fs::remove_file(&tmp);
                return Err(SshError::file(&self.target, e));
            }
        } else if self.target.exists() {
            fs::remove_file(&self.target).map_err(|e| SshError::file(&self.target, e))?;
        }

        tracing::info!("Restored {}", self.target.display());
        Ok(())
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if !self.done {
            if let Err(e) = self.restore_inner() {
                tracing::error!(
                    "Failed to restore {} from {}: {}",
                    self.target.display(),
                    self.backup.display(),
                    e
                );
            }
        }
    }
}
