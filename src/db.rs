// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::backup::{BackupManager, DEFAULT_KEEP};
use crate::error::{LedgerError, Result};
use crate::models::BackupInfo;
use crate::telemetry::{LogLevel, log_system, log_system_with};
use anyhow::Context;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("it.tesoreria", "Tesoreria", "tesoreria"));

pub const DB_FILE: &str = "tesoreria.db";
pub const BACKUP_DIR: &str = "backups";
pub const DATA_DIR_ENV: &str = "TESORERIA_DATA_DIR";

/// Platform application-data directory, unless overridden through
/// `TESORERIA_DATA_DIR`.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().to_path_buf())
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub keep_backups: usize,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            keep_backups: DEFAULT_KEEP,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }
}

/// Handle owning the single long-lived connection.
///
/// All ledger access goes through [`Store::conn`] / [`Store::conn_mut`], which
/// fail with [`LedgerError::StoreClosed`] once the handle has been closed or a
/// restore left it unusable.
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    backups: BackupManager,
    conn: Option<Connection>,
}

impl Store {
    /// Snapshot the existing database (if any), then open it read/write.
    pub fn open(config: StoreConfig) -> Result<Store> {
        fs::create_dir_all(&config.data_dir)?;
        let backups = BackupManager::new(config.backup_dir(), config.keep_backups)?;
        let db_path = config.db_path();
        if db_path.exists() {
            if let Err(e) = backups.snapshot(&db_path) {
                log_system_with(LogLevel::Error, "Backup failed", &e.to_string());
            }
        }
        let conn = connect(&db_path)?;
        log_system_with(LogLevel::Db, "Database opened", &db_path.display().to_string());
        Ok(Store {
            config,
            backups,
            conn: Some(conn),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.db_path()
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(LedgerError::StoreClosed)
    }

    pub fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(LedgerError::StoreClosed)
    }

    /// Close the connection, folding the write-ahead log into the main file.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => log_system(LogLevel::Db, "Database closed"),
                Err((_, e)) => {
                    log_system_with(LogLevel::Error, "Database close failed", &e.to_string())
                }
            }
        }
    }

    /// Re-open after a close or a failed restore.
    pub fn reopen(&mut self) -> Result<()> {
        if self.conn.is_none() {
            self.conn = Some(connect(&self.db_path())?);
        }
        Ok(())
    }

    /// Checkpoint the live database and snapshot it.
    pub fn create_backup(&self) -> Result<String> {
        let conn = self.conn()?;
        checkpoint(conn)?;
        let name = self.backups.snapshot(&self.db_path())?;
        log_system_with(LogLevel::Action, "Manual backup", &name);
        Ok(name)
    }

    pub fn list_backups(&self) -> Vec<BackupInfo> {
        self.backups.list().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list backups");
            Vec::new()
        })
    }

    /// Replace the live database with `name` and re-open it.
    ///
    /// On `false` the handle may be closed; callers must re-run [`Store::reopen`]
    /// or abort instead of assuming the store is usable.
    pub fn restore_backup(&mut self, name: &str) -> bool {
        match self.try_restore(name) {
            Ok(()) => {
                log_system_with(LogLevel::Action, "Database restored", &name);
                true
            }
            Err(e) => {
                log_system_with(LogLevel::Error, "Restore failed", &e.to_string());
                false
            }
        }
    }

    fn try_restore(&mut self, name: &str) -> Result<()> {
        self.backups.resolve(name)?;
        self.close();
        let db_path = self.db_path();
        self.backups.restore_into(name, &db_path)?;
        self.conn = Some(connect(&db_path)?);
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open a database file with WAL journaling and the current schema.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |r| r.get(0))?;
    tracing::debug!(journal_mode = %mode, path = %path.display(), "connection opened");
    init_schema(&conn)?;
    Ok(conn)
}

fn checkpoint(conn: &Connection) -> Result<()> {
    let _: (i64, i64, i64) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?))
    })?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS members(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        surname TEXT NOT NULL,
        external_ref TEXT,
        removed_at TEXT DEFAULT NULL
    );

    CREATE TABLE IF NOT EXISTS purchases(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        unit_price TEXT NOT NULL,
        advance TEXT NOT NULL DEFAULT '0',
        completed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        closed_at TEXT DEFAULT NULL,
        fund_expense INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS quotas(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        purchase_id INTEGER NOT NULL,
        member_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        amount_paid TEXT NOT NULL DEFAULT '0',
        UNIQUE(purchase_id, member_id),
        FOREIGN KEY(purchase_id) REFERENCES purchases(id) ON DELETE CASCADE,
        FOREIGN KEY(member_id) REFERENCES members(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_quotas_purchase ON quotas(purchase_id);

    -- append-only manual adjustments of the cash fund
    CREATE TABLE IF NOT EXISTS fund_movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    migrate(conn)?;
    Ok(())
}

struct ColumnMigration {
    table: &'static str,
    column: &'static str,
    definition: &'static str,
    backfill: Option<&'static str>,
}

const MIGRATIONS: &[ColumnMigration] = &[
    ColumnMigration {
        table: "members",
        column: "external_ref",
        definition: "TEXT",
        backfill: None,
    },
    ColumnMigration {
        table: "members",
        column: "removed_at",
        definition: "TEXT DEFAULT NULL",
        backfill: None,
    },
    ColumnMigration {
        table: "purchases",
        column: "advance",
        definition: "TEXT NOT NULL DEFAULT '0'",
        backfill: None,
    },
    ColumnMigration {
        table: "purchases",
        column: "fund_expense",
        definition: "INTEGER NOT NULL DEFAULT 0",
        backfill: None,
    },
    ColumnMigration {
        table: "purchases",
        column: "closed_at",
        definition: "TEXT DEFAULT NULL",
        backfill: Some("UPDATE purchases SET closed_at = created_at WHERE completed = 1"),
    },
];

/// Add missing columns to databases created by older versions. Safe to run on
/// every open.
fn migrate(conn: &Connection) -> Result<()> {
    for m in MIGRATIONS {
        if has_column(conn, m.table, m.column)? {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            m.table, m.column, m.definition
        ))?;
        if let Some(sql) = m.backfill {
            conn.execute_batch(sql)?;
        }
        tracing::info!(table = m.table, column = m.column, "schema migrated");
    }
    Ok(())
}

pub fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |r| r.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
