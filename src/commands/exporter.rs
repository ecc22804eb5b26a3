// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::arg_str;
use crate::ledger::{debtors, get_purchase, list_members};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("members", sub)) => {
            let out = arg_str(sub, "out")?;
            let n = export_members(conn, Path::new(out))?;
            println!("Exported {} members to {}", n, out);
        }
        Some(("debtors", sub)) => {
            let out = arg_str(sub, "out")?;
            let purchase = *sub.get_one::<i64>("purchase").context("Missing --purchase")?;
            let n = export_debtors(conn, purchase, Path::new(out))?;
            println!("Exported {} debtors to {}", n, out);
        }
        _ => {}
    }
    Ok(())
}

/// Write the active roster as `surname,name,ref`. Returns the row count.
pub fn export_members(conn: &Connection, out: &Path) -> Result<usize> {
    let members = list_members(conn)?;
    let mut wtr = csv::Writer::from_path(out)
        .with_context(|| format!("Create {}", out.display()))?;
    wtr.write_record(["surname", "name", "ref"])?;
    for m in &members {
        wtr.write_record([
            m.surname.as_str(),
            m.name.as_str(),
            m.external_ref.as_deref().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(members.len())
}

/// Write the members still owing money on a purchase.
pub fn export_debtors(conn: &Connection, purchase_id: i64, out: &Path) -> Result<usize> {
    let purchase = get_purchase(conn, purchase_id)?;
    let rows = debtors(conn, purchase_id)?;
    let mut wtr = csv::Writer::from_path(out)
        .with_context(|| format!("Create {}", out.display()))?;
    wtr.write_record(["purchase", "surname", "name", "ref", "due"])?;
    for d in &rows {
        wtr.write_record([
            purchase.name.clone(),
            d.surname.clone(),
            d.name.clone(),
            d.external_ref.clone().unwrap_or_default(),
            d.due.round_dp(2).to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(rows.len())
}
