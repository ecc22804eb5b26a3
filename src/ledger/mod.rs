// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Member, purchase, quota and fund registries plus the derived balance.

pub mod balance;
pub mod fund;
pub mod members;
pub mod purchases;
pub mod quotas;

pub use balance::get_global_balance;
pub use fund::{add_fund_movement, cash_journal, list_fund_movements};
pub use members::{
    add_member, get_member, list_all_members, list_members, soft_delete_all_active_members,
    soft_delete_member, update_member,
};
pub use purchases::{
    complete_purchase, create_purchase, delete_purchase, get_purchase, list_purchases,
    update_purchase,
};
pub use quotas::{debtors, get_quota, list_quotas_for_purchase, quota_for_member, update_quota};

use crate::db::Store;
use crate::error::Result;
use crate::telemetry::{LogLevel, log_system_with};
use rusqlite::Connection;

/// Delete every quota, purchase and fund movement in one transaction.
/// Members are kept.
pub fn clear_ledger(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM quotas", [])?;
    tx.execute("DELETE FROM purchases", [])?;
    tx.execute("DELETE FROM fund_movements", [])?;
    tx.commit()?;
    Ok(())
}

/// Start a new accounting year: take a safety snapshot, then clear the ledger.
/// Nothing is deleted if the snapshot cannot be written.
pub fn reset_annual_data(store: &mut Store) -> Result<String> {
    let snapshot = store.create_backup()?;
    clear_ledger(store.conn_mut()?)?;
    log_system_with(LogLevel::Action, "Annual reset", &snapshot);
    Ok(snapshot)
}
