// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Purchase registry and its two-state lifecycle.
//!
//! A purchase is `Open` until [`complete_purchase`] stamps it `Completed`;
//! there is no way back. Fund-expense purchases are born completed. While a
//! purchase is completed its fields and quotas are frozen.

use crate::error::{LedgerError, Result};
use crate::models::{Purchase, PurchaseDraft, PurchaseState};
use crate::telemetry::{LogLevel, log_system_with};
use crate::utils::{now, stored_decimal};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

const PURCHASE_COLUMNS: &str =
    "id, name, unit_price, advance, completed, created_at, closed_at, fund_expense";

fn purchase_from_row(r: &Row<'_>) -> rusqlite::Result<(Purchase, String, String)> {
    let unit_price: String = r.get(2)?;
    let advance: String = r.get(3)?;
    Ok((
        Purchase {
            id: r.get(0)?,
            name: r.get(1)?,
            unit_price: Decimal::ZERO,
            advance: Decimal::ZERO,
            completed: r.get(4)?,
            created_at: r.get(5)?,
            closed_at: r.get(6)?,
            fund_expense: r.get(7)?,
        },
        unit_price,
        advance,
    ))
}

fn decode(raw: (Purchase, String, String)) -> Result<Purchase> {
    let (mut p, unit_price, advance) = raw;
    p.unit_price = stored_decimal(&unit_price)?;
    p.advance = stored_decimal(&advance)?;
    Ok(p)
}

fn validate(draft: &PurchaseDraft) -> Result<String> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("Purchase name is required"));
    }
    if draft.unit_price < Decimal::ZERO {
        return Err(LedgerError::validation("Unit price cannot be negative"));
    }
    if draft.advance < Decimal::ZERO {
        return Err(LedgerError::validation("Advance cannot be negative"));
    }
    Ok(name.to_string())
}

pub(crate) fn ensure_open(p: &Purchase) -> Result<()> {
    match p.state() {
        PurchaseState::Open => Ok(()),
        PurchaseState::Completed => Err(LedgerError::PurchaseCompleted(p.id)),
    }
}

/// Create a purchase and seed its quotas in one transaction.
///
/// Fund expenses are stored completed and produce a single negative fund
/// movement. Other purchases get one quota per listed member, or per active
/// member when no list (or an empty one) is given.
pub fn create_purchase(conn: &mut Connection, draft: &PurchaseDraft) -> Result<i64> {
    let name = validate(draft)?;
    let at = now();
    let tx = conn.transaction()?;

    let id = if draft.fund_expense {
        tx.execute(
            "INSERT INTO purchases(name, unit_price, advance, completed, created_at, closed_at, fund_expense)
             VALUES (?1, ?2, ?3, 1, ?4, ?4, 1)",
            params![&name, draft.unit_price.to_string(), draft.advance.to_string(), at],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO fund_movements(amount, description, created_at) VALUES (?1, ?2, ?3)",
            params![
                (-draft.unit_price).to_string(),
                format!("Fund expense: {}", name),
                at
            ],
        )?;
        id
    } else {
        tx.execute(
            "INSERT INTO purchases(name, unit_price, advance, completed, created_at, fund_expense)
             VALUES (?1, ?2, ?3, 0, ?4, 0)",
            params![&name, draft.unit_price.to_string(), draft.advance.to_string(), at],
        )?;
        let id = tx.last_insert_rowid();
        match draft.members.as_deref() {
            Some(ids) if !ids.is_empty() => {
                let targets: BTreeSet<i64> = ids.iter().copied().collect();
                let mut stmt = tx.prepare(
                    "INSERT INTO quotas(purchase_id, member_id, quantity, amount_paid) VALUES (?1, ?2, 1, '0')",
                )?;
                for member_id in targets {
                    stmt.execute(params![id, member_id])?;
                }
            }
            _ => {
                tx.execute(
                    "INSERT INTO quotas(purchase_id, member_id, quantity, amount_paid)
                     SELECT ?1, id, 1, '0' FROM members WHERE removed_at IS NULL",
                    params![id],
                )?;
            }
        }
        id
    };
    tx.commit()?;
    log_system_with(
        LogLevel::Action,
        "Purchase created",
        &(id, &name, draft.unit_price, draft.fund_expense),
    );
    Ok(id)
}

/// Edit an open purchase. When `draft.members` is given, the quota set is
/// brought in line with it: new members get a fresh quota, unlisted ones lose
/// theirs. The purchase kind cannot change.
pub fn update_purchase(conn: &mut Connection, id: i64, draft: &PurchaseDraft) -> Result<()> {
    let name = validate(draft)?;
    let current = get_purchase(conn, id)?;
    ensure_open(&current)?;

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE purchases SET name = ?1, unit_price = ?2, advance = ?3 WHERE id = ?4",
        params![name, draft.unit_price.to_string(), draft.advance.to_string(), id],
    )?;
    if let Some(ids) = draft.members.as_deref() {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let existing: BTreeSet<i64> = {
            let mut stmt = tx.prepare("SELECT member_id FROM quotas WHERE purchase_id = ?1")?;
            let rows = stmt.query_map(params![id], |r| r.get::<_, i64>(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        for member_id in wanted.difference(&existing) {
            tx.execute(
                "INSERT INTO quotas(purchase_id, member_id, quantity, amount_paid) VALUES (?1, ?2, 1, '0')",
                params![id, member_id],
            )?;
        }
        for member_id in existing.difference(&wanted) {
            tx.execute(
                "DELETE FROM quotas WHERE purchase_id = ?1 AND member_id = ?2",
                params![id, member_id],
            )?;
        }
    }
    tx.commit()?;
    log_system_with(LogLevel::Action, "Purchase updated", &id);
    Ok(())
}

/// Delete a purchase; its quotas go with it.
pub fn delete_purchase(conn: &Connection, id: i64) -> Result<()> {
    let purchase = get_purchase(conn, id)?;
    conn.execute("DELETE FROM purchases WHERE id = ?1", params![id])?;
    log_system_with(LogLevel::Action, "Purchase deleted", &purchase);
    Ok(())
}

/// Open -> Completed. Irreversible.
pub fn complete_purchase(conn: &Connection, id: i64) -> Result<()> {
    let purchase = get_purchase(conn, id)?;
    ensure_open(&purchase)?;
    conn.execute(
        "UPDATE purchases SET completed = 1, closed_at = ?1 WHERE id = ?2 AND completed = 0",
        params![now(), id],
    )?;
    log_system_with(LogLevel::Action, "Purchase completed", &id);
    Ok(())
}

pub fn get_purchase(conn: &Connection, id: i64) -> Result<Purchase> {
    let raw = conn
        .query_row(
            &format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1"),
            params![id],
            purchase_from_row,
        )
        .optional()?
        .ok_or(LedgerError::NotFound { entity: "Purchase", id })?;
    decode(raw)
}

/// Newest first.
pub fn list_purchases(conn: &Connection) -> Result<Vec<Purchase>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], purchase_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode(row?)?);
    }
    Ok(out)
}
