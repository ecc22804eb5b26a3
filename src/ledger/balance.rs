// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::models::GlobalBalance;
use crate::utils::{accumulate, line_total, stored_decimal};
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Recompute the fund position from every quota, purchase and movement.
///
/// - inflows: all amounts paid on quotas plus all fund movements
/// - outflows: the apportioned cost of completed purchases plus the supplier
///   advance of open ones
/// - restricted: amounts paid on quotas of open purchases
pub fn get_global_balance(conn: &Connection) -> Result<GlobalBalance> {
    let mut inflows = Decimal::ZERO;
    let mut outflows = Decimal::ZERO;
    let mut restricted = Decimal::ZERO;

    let mut stmt = conn.prepare(
        "SELECT q.quantity, q.amount_paid, p.unit_price, p.completed
         FROM quotas q JOIN purchases p ON q.purchase_id = p.id",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        let quantity: i64 = r.get(0)?;
        let paid = stored_decimal(&r.get::<_, String>(1)?)?;
        let unit_price = stored_decimal(&r.get::<_, String>(2)?)?;
        let completed: bool = r.get(3)?;
        accumulate(&mut inflows, paid, "inflows")?;
        if completed {
            accumulate(&mut outflows, line_total(quantity, unit_price)?, "outflows")?;
        } else {
            accumulate(&mut restricted, paid, "restricted funds")?;
        }
    }

    let mut stmt = conn.prepare("SELECT advance FROM purchases WHERE completed = 0")?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        accumulate(&mut outflows, stored_decimal(&r.get::<_, String>(0)?)?, "outflows")?;
    }

    let mut stmt = conn.prepare("SELECT amount FROM fund_movements")?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        accumulate(&mut inflows, stored_decimal(&r.get::<_, String>(0)?)?, "inflows")?;
    }

    let real_cash = inflows
        .checked_sub(outflows)
        .ok_or(LedgerError::Overflow("real cash"))?;
    let available_cash = real_cash
        .checked_sub(restricted)
        .ok_or(LedgerError::Overflow("available cash"))?;
    Ok(GlobalBalance {
        real_cash,
        restricted_funds: restricted,
        available_cash,
    })
}
