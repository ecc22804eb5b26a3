// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use crate::models::{FundMovement, JournalEntry, JournalSource};
use crate::telemetry::{LogLevel, log_system_with};
use crate::utils::{line_total, now, stored_decimal};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

/// Append a manual movement to the cash fund. Movements are never edited.
pub fn add_fund_movement(conn: &Connection, amount: Decimal, description: &str) -> Result<i64> {
    let description = description.trim();
    conn.execute(
        "INSERT INTO fund_movements(amount, description, created_at) VALUES (?1, ?2, ?3)",
        params![amount.to_string(), description, now()],
    )?;
    let id = conn.last_insert_rowid();
    log_system_with(
        LogLevel::Action,
        "Fund movement recorded",
        &(id, amount, description),
    );
    Ok(id)
}

/// Newest first.
pub fn list_fund_movements(conn: &Connection) -> Result<Vec<FundMovement>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, description, created_at FROM fund_movements ORDER BY created_at DESC, id DESC",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let amount: String = r.get(1)?;
        out.push(FundMovement {
            id: r.get(0)?,
            amount: stored_decimal(&amount)?,
            description: r.get(2)?,
            at: r.get(3)?,
        });
    }
    Ok(out)
}

/// Cash journal: manual movements plus the supplier payment implied by every
/// completed member-apportioned purchase, newest first.
pub fn cash_journal(conn: &Connection, limit: usize) -> Result<Vec<JournalEntry>> {
    let mut entries: Vec<JournalEntry> = list_fund_movements(conn)?
        .into_iter()
        .map(|m| JournalEntry {
            source: JournalSource::Manual,
            ref_id: m.id,
            amount: m.amount,
            description: m.description,
            at: m.at,
        })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.unit_price, COALESCE(p.closed_at, p.created_at),
                COALESCE((SELECT SUM(quantity) FROM quotas WHERE purchase_id = p.id), 0)
         FROM purchases p WHERE p.completed = 1 AND p.fund_expense = 0",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        let name: String = r.get(1)?;
        let price: String = r.get(2)?;
        let units: i64 = r.get(4)?;
        entries.push(JournalEntry {
            source: JournalSource::SupplierPayment,
            ref_id: r.get(0)?,
            amount: -line_total(units, stored_decimal(&price)?)?,
            description: format!("Payment: {}", name),
            at: r.get(3)?,
        });
    }

    entries.sort_by(|a, b| b.at.cmp(&a.at).then(b.ref_id.cmp(&a.ref_id)));
    entries.truncate(limit);
    Ok(entries)
}
