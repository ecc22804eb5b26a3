// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Timestamped snapshots of the database file.
//!
//! Snapshot names embed a zero-padded local timestamp
//! (`backup_YYYY-MM-DD_HH-MM-SS.db`), so ordering by name is ordering by time.

use crate::error::{LedgerError, Result};
use crate::models::BackupInfo;
use crate::telemetry::{LogLevel, log_system_with};
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_PREFIX: &str = "backup_";
pub const SNAPSHOT_EXT: &str = ".db";
pub const DEFAULT_KEEP: usize = 10;

/// SQLite side files that live next to the main database in WAL mode.
pub const SIDE_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

pub fn snapshot_name(at: NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        SNAPSHOT_PREFIX,
        at.format("%Y-%m-%d_%H-%M-%S"),
        SNAPSHOT_EXT
    )
}

pub fn is_snapshot_name(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_EXT)
}

pub fn side_file(db_path: &Path, suffix: &str) -> PathBuf {
    let mut os = db_path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    keep: usize,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(BackupManager { dir, keep })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `db_path` to a snapshot stamped with the current local time, then prune.
    pub fn snapshot(&self, db_path: &Path) -> Result<String> {
        self.snapshot_at(db_path, Local::now().naive_local())
    }

    pub fn snapshot_at(&self, db_path: &Path, at: NaiveDateTime) -> Result<String> {
        let name = snapshot_name(at);
        fs::copy(db_path, self.dir.join(&name))?;
        tracing::info!(snapshot = %name, "backup written");
        self.prune();
        Ok(name)
    }

    /// Keep the newest `keep` snapshots; deletion failures are logged only.
    pub fn prune(&self) -> usize {
        let mut names = match self.snapshot_names() {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list backups for pruning");
                return 0;
            }
        };
        names.sort_unstable_by(|a, b| b.cmp(a));
        let mut removed = 0;
        for name in names.iter().skip(self.keep) {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => removed += 1,
                Err(e) => {
                    log_system_with(LogLevel::Error, "Backup pruning failed", &name);
                    tracing::warn!(snapshot = %name, error = %e, "could not delete old backup");
                }
            }
        }
        removed
    }

    fn snapshot_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_snapshot_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Snapshots with modification time and size, newest first.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        let mut names = self.snapshot_names()?;
        names.sort_unstable_by(|a, b| b.cmp(a));
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let meta = fs::metadata(self.dir.join(&name))?;
            let modified: DateTime<Local> = meta.modified()?.into();
            out.push(BackupInfo {
                name,
                modified,
                size: meta.len(),
            });
        }
        Ok(out)
    }

    /// Resolve a snapshot file name, refusing anything that is not a plain
    /// snapshot name inside the backup directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let plain = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == name);
        if !plain || !is_snapshot_name(name) {
            return Err(LedgerError::Restore(format!("'{}' is not a backup name", name)));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(LedgerError::Restore(format!("backup '{}' does not exist", name)));
        }
        Ok(path)
    }

    /// Replace the live database with a snapshot. The store handle must be
    /// closed before this is called.
    ///
    /// The old main file and its `-wal`/`-shm` side files are removed first so
    /// that no stale write-ahead state is replayed against the restored file.
    pub fn restore_into(&self, name: &str, db_path: &Path) -> Result<()> {
        let source = self.resolve(name)?;
        remove_best_effort(db_path);
        for suffix in SIDE_SUFFIXES {
            remove_best_effort(&side_file(db_path, suffix));
        }
        fs::copy(&source, db_path)
            .map_err(|e| LedgerError::Restore(format!("copy of '{}' failed: {}", name, e)))?;
        Ok(())
    }
}

fn remove_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove file before restore");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn snapshot_names_sort_chronologically() {
        let early = NaiveDate::from_ymd_opt(2025, 1, 9)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        let late = NaiveDate::from_ymd_opt(2025, 10, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(snapshot_name(early), "backup_2025-01-09_09-05-03.db");
        assert!(snapshot_name(early) < snapshot_name(late));
    }

    #[test]
    fn resolve_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = BackupManager::new(dir.path(), DEFAULT_KEEP).unwrap();
        assert!(mgr.resolve("../tesoreria.db").is_err());
        assert!(mgr.resolve("backups/backup_2025-01-01_00-00-00.db").is_err());
        assert!(mgr.resolve("backup_2025-01-01_00-00-00.db").is_err());
    }

    #[test]
    fn side_files_are_suffixed() {
        let p = side_file(Path::new("/data/tesoreria.db"), "-wal");
        assert_eq!(p, PathBuf::from("/data/tesoreria.db-wal"));
    }
}
