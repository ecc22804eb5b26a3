// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg_str, opt_str};
use crate::ledger::{add_fund_movement, cash_journal, list_fund_movements};
use crate::models::JournalSource;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let amount = parse_decimal(arg_str(sub, "amount")?)?;
            let description = opt_str(sub, "description").unwrap_or_default();
            let id = add_fund_movement(conn, amount, description)?;
            println!("Recorded fund movement {} of {}", id, fmt_money(&amount));
        }
        Some(("list", sub)) => {
            let movements = list_fund_movements(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &movements)? {
                let rows = movements
                    .into_iter()
                    .map(|mv| {
                        vec![
                            mv.at.format("%Y-%m-%d %H:%M").to_string(),
                            fmt_money(&mv.amount),
                            mv.description,
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "Amount", "Description"], rows));
            }
        }
        Some(("journal", sub)) => {
            let limit = *sub.get_one::<usize>("limit").context("Missing --limit")?;
            let entries = cash_journal(conn, limit)?;
            if !maybe_print_json(sub.get_flag("json"), &entries)? {
                let rows = entries
                    .into_iter()
                    .map(|e| {
                        let source = match e.source {
                            JournalSource::Manual => "fund",
                            JournalSource::SupplierPayment => "purchase",
                        };
                        vec![
                            e.at.format("%Y-%m-%d %H:%M").to_string(),
                            source.to_string(),
                            fmt_money(&e.amount),
                            e.description,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Date", "Source", "Amount", "Description"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
