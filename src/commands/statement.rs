// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg_str, delimiter, opt_str};
use crate::ledger::list_members;
use crate::models::StatementMatch;
use crate::reconcile::statement::{apply_matches, match_statement_file};
use crate::utils::{fmt_money, maybe_print_json, parse_id_list, pretty_table};
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("match", sub)) => match_and_apply(conn, sub),
        _ => Ok(()),
    }
}

/// Pick confirmed matches: `all`, or 1-based indices as printed.
pub fn select_matches(matches: &[StatementMatch], selection: &str) -> Result<Vec<StatementMatch>> {
    if selection.eq_ignore_ascii_case("all") {
        return Ok(matches.to_vec());
    }
    let mut out = Vec::new();
    for idx in parse_id_list(selection)? {
        let Some(found) = usize::try_from(idx)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| matches.get(i))
        else {
            bail!("No match number {}", idx);
        };
        out.push(found.clone());
    }
    Ok(out)
}

fn match_and_apply(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = arg_str(sub, "path")?;
    let purchase_id = *sub.get_one::<i64>("purchase").context("Missing --purchase")?;
    let members = list_members(conn)?;
    let matches = match_statement_file(Path::new(path), delimiter(sub)?, &members)
        .with_context(|| format!("Analyse statement {}", path))?;

    if !maybe_print_json(sub.get_flag("json"), &matches)? {
        let rows = matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                vec![
                    (i + 1).to_string(),
                    m.date.map(|d| d.to_string()).unwrap_or_default(),
                    m.display_name.clone(),
                    fmt_money(&m.amount),
                    m.confidence.clone(),
                    m.source_line.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["#", "Date", "Member", "Amount", "Match", "Line"], rows)
        );
    }

    match opt_str(sub, "apply") {
        Some(selection) => {
            let confirmed = select_matches(&matches, selection)?;
            let applied = apply_matches(conn, purchase_id, &confirmed)?;
            println!("Recorded {} payments on purchase {}", applied, purchase_id);
        }
        None if !matches.is_empty() => {
            println!("Review the matches, then re-run with --apply all (or --apply 1,3,...)");
        }
        None => println!("No payments matched a member"),
    }
    Ok(())
}
