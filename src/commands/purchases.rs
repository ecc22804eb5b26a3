// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg_str, opt_str};
use crate::ledger::{
    complete_purchase, create_purchase, delete_purchase, get_purchase, list_purchases,
    list_quotas_for_purchase, update_purchase, update_quota,
};
use crate::models::{PurchaseDraft, PurchaseState};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_id, parse_id_list, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::cmp::Ordering;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let draft = draft_from_args(sub)?;
            let id = create_purchase(conn, &draft)?;
            if draft.fund_expense {
                println!("Recorded fund expense '{}' (id {})", draft.name, id);
            } else {
                println!("Created purchase '{}' (id {})", draft.name, id);
            }
        }
        Some(("edit", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            let draft = edit_draft(conn, id, sub)?;
            update_purchase(conn, id, &draft)?;
            println!("Updated purchase {}", id);
        }
        Some(("rm", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            delete_purchase(conn, id)?;
            println!("Deleted purchase {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("quotas", sub)) => quotas(conn, sub)?,
        Some(("quota", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            let qty = *sub.get_one::<i64>("qty").context("Missing --qty")?;
            let paid = parse_decimal(arg_str(sub, "paid")?)?;
            update_quota(conn, id, qty, paid)?;
            println!("Quota {}: quantity {}, paid {}", id, qty, fmt_money(&paid));
        }
        Some(("complete", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            complete_purchase(conn, id)?;
            println!("Purchase {} completed", id);
        }
        _ => {}
    }
    Ok(())
}

fn draft_from_args(sub: &clap::ArgMatches) -> Result<PurchaseDraft> {
    let members = opt_str(sub, "members").map(parse_id_list).transpose()?;
    Ok(PurchaseDraft {
        name: arg_str(sub, "name")?.to_string(),
        unit_price: parse_decimal(arg_str(sub, "price")?)?,
        advance: parse_decimal(arg_str(sub, "advance")?)?,
        members,
        fund_expense: sub.get_flag("fund_expense"),
    })
}

/// Start from the stored purchase and override only the fields given.
fn edit_draft(conn: &Connection, id: i64, sub: &clap::ArgMatches) -> Result<PurchaseDraft> {
    let current = get_purchase(conn, id)?;
    Ok(PurchaseDraft {
        name: opt_str(sub, "name").map_or(current.name, str::to_string),
        unit_price: opt_str(sub, "price")
            .map(parse_decimal)
            .transpose()?
            .unwrap_or(current.unit_price),
        advance: opt_str(sub, "advance")
            .map(parse_decimal)
            .transpose()?
            .unwrap_or(current.advance),
        members: opt_str(sub, "members").map(parse_id_list).transpose()?,
        fund_expense: current.fund_expense,
    })
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let purchases = list_purchases(conn)?;
    if !maybe_print_json(sub.get_flag("json"), &purchases)? {
        let rows = purchases
            .into_iter()
            .map(|p| {
                let state = match (p.state(), p.fund_expense) {
                    (_, true) => "fund expense",
                    (PurchaseState::Open, _) => "open",
                    (PurchaseState::Completed, _) => "completed",
                };
                vec![
                    p.id.to_string(),
                    p.name,
                    fmt_money(&p.unit_price),
                    fmt_money(&p.advance),
                    state.to_string(),
                    p.created_at.format("%Y-%m-%d").to_string(),
                    p.closed_at
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Unit price", "Advance", "State", "Created", "Closed"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct QuotaLine {
    quota_id: i64,
    member: String,
    quantity: i64,
    owed: rust_decimal::Decimal,
    paid: rust_decimal::Decimal,
    status: &'static str,
}

fn quotas(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(arg_str(sub, "id")?)?;
    let purchase = get_purchase(conn, id)?;
    let lines: Vec<QuotaLine> = list_quotas_for_purchase(conn, id)?
        .into_iter()
        .map(|q| {
            let owed = q.amount_owed(purchase.unit_price)?;
            let status = match q.amount_paid.cmp(&owed) {
                Ordering::Less => "underpaid",
                Ordering::Equal => "paid",
                Ordering::Greater => "overpaid",
            };
            Ok(QuotaLine {
                quota_id: q.id,
                member: format!("{} {}", q.surname, q.name),
                quantity: q.quantity,
                owed,
                paid: q.amount_paid,
                status,
            })
        })
        .collect::<crate::error::Result<_>>()?;
    if !maybe_print_json(sub.get_flag("json"), &lines)? {
        let rows = lines
            .into_iter()
            .map(|l| {
                vec![
                    l.quota_id.to_string(),
                    l.member,
                    l.quantity.to_string(),
                    fmt_money(&l.owed),
                    fmt_money(&l.paid),
                    l.status.to_string(),
                ]
            })
            .collect();
        println!("{} ({:?})", purchase.name, purchase.state());
        println!(
            "{}",
            pretty_table(&["Quota", "Member", "Qty", "Owed", "Paid", "Status"], rows)
        );
    }
    Ok(())
}
