// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{get_member, list_purchases, list_quotas_for_purchase};
use crate::models::PurchaseState;
use crate::utils::{fmt_money, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Collect `(issue, detail)` pairs. Empty means the ledger looks consistent.
pub fn diagnose(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();
    for p in list_purchases(conn)? {
        if p.fund_expense {
            continue;
        }
        for q in list_quotas_for_purchase(conn, p.id)? {
            let owed = q.amount_owed(p.unit_price)?;
            let who = format!("{} {}", q.surname, q.name);
            let removed = p.state() == PurchaseState::Open
                && !get_member(conn, q.member_id)?.is_active();
            match p.state() {
                // Settled purchases should balance exactly.
                PurchaseState::Completed if q.amount_paid < owed => issues.push((
                    "unpaid_after_close".into(),
                    format!("{}: {} owes {}", p.name, who, fmt_money(&(owed - q.amount_paid))),
                )),
                PurchaseState::Completed if q.amount_paid > owed => issues.push((
                    "overpaid".into(),
                    format!("{}: {} paid {} extra", p.name, who, fmt_money(&(q.amount_paid - owed))),
                )),
                PurchaseState::Open if removed => issues.push((
                    "removed_member_quota".into(),
                    format!("{}: {}", p.name, who),
                )),
                _ => {}
            }
        }
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows: Vec<Vec<String>> = diagnose(conn)?
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
