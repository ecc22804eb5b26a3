// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fs;
use tesoreria::backup::{BackupManager, SIDE_SUFFIXES, side_file, snapshot_name};
use tesoreria::db::{self, Store, StoreConfig};
use tesoreria::error::LedgerError;
use tesoreria::ledger::{
    add_fund_movement, add_member, create_purchase, list_fund_movements, list_members,
    list_purchases, reset_annual_data,
};
use tesoreria::models::PurchaseDraft;

fn surnames(store: &Store) -> Vec<String> {
    list_members(store.conn().unwrap())
        .unwrap()
        .into_iter()
        .map(|m| m.surname)
        .collect()
}

#[test]
fn rotation_keeps_the_newest_ten() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("live.db");
    fs::write(&db_path, b"data").unwrap();
    let mgr = BackupManager::new(tmp.path().join("backups"), 10).unwrap();

    let base = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let mut written = Vec::new();
    for i in 0..12 {
        let at = base + chrono::Duration::minutes(i);
        written.push(mgr.snapshot_at(&db_path, at).unwrap());
    }
    let listed: Vec<String> = mgr.list().unwrap().into_iter().map(|b| b.name).collect();
    assert_eq!(listed.len(), 10);
    written.reverse();
    assert_eq!(listed, written[..10].to_vec());
    assert_eq!(listed[0], snapshot_name(base + chrono::Duration::minutes(11)));

    // unrelated files are never pruned
    fs::write(tmp.path().join("backups").join("notes.txt"), b"x").unwrap();
    assert_eq!(mgr.prune(), 0);
    assert!(tmp.path().join("backups").join("notes.txt").exists());
}

#[test]
fn open_snapshots_existing_database_and_restore_rolls_back() {
    let tmp = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(tmp.path());

    let mut store = Store::open(config.clone()).unwrap();
    assert!(store.list_backups().is_empty());
    add_member(store.conn().unwrap(), "Mario", "Rossi", None).unwrap();
    store.close();
    assert!(!store.is_open());
    assert!(matches!(store.conn().unwrap_err(), LedgerError::StoreClosed));
    drop(store);

    let mut store = Store::open(config).unwrap();
    let backups = store.list_backups();
    assert_eq!(backups.len(), 1);
    add_member(store.conn().unwrap(), "Anna", "Neri", None).unwrap();
    assert_eq!(surnames(&store).len(), 2);

    assert!(store.restore_backup(&backups[0].name));
    assert!(store.is_open());
    assert_eq!(surnames(&store), vec!["Rossi".to_string()]);
}

#[test]
fn restore_discards_stale_write_ahead_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(tmp.path());
    let mut store = Store::open(config.clone()).unwrap();
    add_member(store.conn().unwrap(), "Mario", "Rossi", None).unwrap();
    drop(store);

    let mut store = Store::open(config).unwrap();
    let snapshot = store.list_backups()[0].name.clone();
    store.close();

    // leave a live write-ahead log holding a member the snapshot never saw
    let db_path = store.db_path();
    let stale: Vec<(std::path::PathBuf, Vec<u8>)> = {
        let raw = Connection::open(&db_path).unwrap();
        raw.execute_batch("PRAGMA wal_autocheckpoint = 0;").unwrap();
        add_member(&raw, "Anna", "Neri", None).unwrap();
        SIDE_SUFFIXES
            .iter()
            .map(|suffix| {
                let path = side_file(&db_path, suffix);
                let bytes = fs::read(&path).unwrap();
                (path, bytes)
            })
            .collect()
    };
    for (path, bytes) in &stale {
        fs::write(path, bytes).unwrap();
        assert!(path.exists());
    }

    store.backups().restore_into(&snapshot, &db_path).unwrap();
    for (path, _) in &stale {
        assert!(!path.exists(), "{} survived the restore", path.display());
    }
    store.reopen().unwrap();
    assert_eq!(surnames(&store), vec!["Rossi".to_string()]);
}

#[test]
fn failed_restore_leaves_store_usable() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(StoreConfig::new(tmp.path())).unwrap();
    add_member(store.conn().unwrap(), "Mario", "Rossi", None).unwrap();

    assert!(!store.restore_backup("backup_2000-01-01_00-00-00.db"));
    assert!(!store.restore_backup("../tesoreria.db"));
    store.reopen().unwrap();
    assert_eq!(surnames(&store), vec!["Rossi".to_string()]);
}

#[test]
fn annual_reset_backs_up_then_clears() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(StoreConfig::new(tmp.path())).unwrap();
    {
        let conn = store.conn_mut().unwrap();
        add_member(conn, "Mario", "Rossi", None).unwrap();
        create_purchase(
            conn,
            &PurchaseDraft {
                name: "Magliette".into(),
                unit_price: Decimal::from(10),
                ..Default::default()
            },
        )
        .unwrap();
        add_fund_movement(conn, Decimal::from(50), "cassa").unwrap();
    }

    let snapshot = reset_annual_data(&mut store).unwrap();
    let conn = store.conn().unwrap();
    assert!(list_purchases(conn).unwrap().is_empty());
    assert!(list_fund_movements(conn).unwrap().is_empty());
    assert_eq!(list_members(conn).unwrap().len(), 1);

    // the safety snapshot still holds the cleared data
    let saved = Connection::open(store.backups().dir().join(&snapshot)).unwrap();
    let purchases: i64 = saved
        .query_row("SELECT COUNT(*) FROM purchases", [], |r| r.get(0))
        .unwrap();
    assert_eq!(purchases, 1);
}

#[test]
fn migrations_upgrade_old_schema_idempotently() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE members(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, surname TEXT NOT NULL);
        CREATE TABLE purchases(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            unit_price TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE TABLE quotas(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            purchase_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            amount_paid TEXT NOT NULL DEFAULT '0'
        );
        INSERT INTO members(name, surname) VALUES ('Mario', 'Rossi');
        INSERT INTO purchases(name, unit_price, completed, created_at)
            VALUES ('Felpe', '12.5', 1, '2024-05-01 10:00:00');
        "#,
    )
    .unwrap();

    db::init_schema(&conn).unwrap();
    db::init_schema(&conn).unwrap();

    for (table, column) in [
        ("members", "external_ref"),
        ("members", "removed_at"),
        ("purchases", "advance"),
        ("purchases", "fund_expense"),
        ("purchases", "closed_at"),
    ] {
        assert!(db::has_column(&conn, table, column).unwrap(), "{table}.{column}");
    }
    let p = &list_purchases(&conn).unwrap()[0];
    assert_eq!(p.closed_at, Some(p.created_at));
    assert!(!p.fund_expense);
    assert_eq!(list_members(&conn).unwrap().len(), 1);
}
