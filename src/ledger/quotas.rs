// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::ledger::purchases::{ensure_open, get_purchase};
use crate::models::{Debtor, Quota, QuotaDetail};
use crate::utils::stored_decimal;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

fn quota_from_parts(
    id: i64,
    purchase_id: i64,
    member_id: i64,
    quantity: i64,
    paid: &str,
) -> Result<Quota> {
    Ok(Quota {
        id,
        purchase_id,
        member_id,
        quantity,
        amount_paid: stored_decimal(paid)?,
    })
}

pub fn get_quota(conn: &Connection, id: i64) -> Result<Quota> {
    let (purchase_id, member_id, quantity, paid): (i64, i64, i64, String) = conn
        .query_row(
            "SELECT purchase_id, member_id, quantity, amount_paid FROM quotas WHERE id = ?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?
        .ok_or(LedgerError::NotFound { entity: "Quota", id })?;
    quota_from_parts(id, purchase_id, member_id, quantity, &paid)
}

pub fn quota_for_member(
    conn: &Connection,
    purchase_id: i64,
    member_id: i64,
) -> Result<Option<Quota>> {
    let row: Option<(i64, i64, String)> = conn
        .query_row(
            "SELECT id, quantity, amount_paid FROM quotas WHERE purchase_id = ?1 AND member_id = ?2",
            params![purchase_id, member_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    row.map(|(id, quantity, paid)| quota_from_parts(id, purchase_id, member_id, quantity, &paid))
        .transpose()
}

/// Quotas of a purchase with the owning member, ordered by surname.
pub fn list_quotas_for_purchase(conn: &Connection, purchase_id: i64) -> Result<Vec<QuotaDetail>> {
    let mut stmt = conn.prepare(
        "SELECT q.id, q.member_id, q.quantity, q.amount_paid, m.name, m.surname, m.external_ref
         FROM quotas q JOIN members m ON q.member_id = m.id
         WHERE q.purchase_id = ?1
         ORDER BY m.surname, m.name, q.id",
    )?;
    let mut rows = stmt.query(params![purchase_id])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let paid: String = r.get(3)?;
        out.push(QuotaDetail {
            id: r.get(0)?,
            purchase_id,
            member_id: r.get(1)?,
            quantity: r.get(2)?,
            amount_paid: stored_decimal(&paid)?,
            name: r.get(4)?,
            surname: r.get(5)?,
            external_ref: r.get(6)?,
        });
    }
    Ok(out)
}

/// Overwrite quantity and amount paid of a quota.
///
/// The amount replaces whatever was recorded before; it is not added to it.
/// Negative values and quotas of completed purchases are rejected.
pub fn update_quota(conn: &Connection, id: i64, quantity: i64, amount_paid: Decimal) -> Result<()> {
    if quantity < 0 {
        return Err(LedgerError::validation("Quantity cannot be negative"));
    }
    if amount_paid < Decimal::ZERO {
        return Err(LedgerError::validation("Amount paid cannot be negative"));
    }
    let quota = get_quota(conn, id)?;
    ensure_open(&get_purchase(conn, quota.purchase_id)?)?;
    conn.execute(
        "UPDATE quotas SET quantity = ?1, amount_paid = ?2 WHERE id = ?3",
        params![quantity, amount_paid.to_string(), id],
    )?;
    tracing::debug!(quota = id, quantity, paid = %amount_paid, "quota updated");
    Ok(())
}

/// Members who paid less than `quantity × unit_price`, with what they still owe.
pub fn debtors(conn: &Connection, purchase_id: i64) -> Result<Vec<Debtor>> {
    let purchase = get_purchase(conn, purchase_id)?;
    let mut out = Vec::new();
    for q in list_quotas_for_purchase(conn, purchase_id)? {
        let owed = q.amount_owed(purchase.unit_price)?;
        if q.amount_paid < owed {
            out.push(Debtor {
                quota_id: q.id,
                member_id: q.member_id,
                surname: q.surname,
                name: q.name,
                external_ref: q.external_ref,
                due: owed - q.amount_paid,
            });
        }
    }
    Ok(out)
}
