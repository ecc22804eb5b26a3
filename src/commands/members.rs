// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg_str, delimiter, opt_str};
use crate::ledger::{
    add_member, list_all_members, list_members, soft_delete_all_active_members,
    soft_delete_member, update_member,
};
use crate::models::MemberOutcome;
use crate::reconcile::roster::{import_roster, parse_roster_file};
use crate::utils::{maybe_print_json, parse_id, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            update_member(
                conn,
                id,
                arg_str(sub, "name")?,
                arg_str(sub, "surname")?,
                opt_str(sub, "ref"),
            )?;
            println!("Updated member {}", id);
        }
        Some(("rm", sub)) => {
            let id = parse_id(arg_str(sub, "id")?)?;
            soft_delete_member(conn, id)?;
            println!("Removed member {} (history kept)", id);
        }
        Some(("rm-all", _)) => {
            let n = soft_delete_all_active_members(conn)?;
            println!("Removed {} members (history kept)", n);
        }
        Some(("import", sub)) => import(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = arg_str(sub, "name")?;
    let surname = arg_str(sub, "surname")?;
    match add_member(conn, name, surname, opt_str(sub, "ref"))? {
        MemberOutcome::Inserted(id) => println!("Added member {} {} (id {})", surname, name, id),
        MemberOutcome::Reactivated(id) => {
            println!("Reactivated member {} {} (id {})", surname, name, id)
        }
        MemberOutcome::AlreadyActive(id) => {
            println!("{} {} is already registered (id {})", surname, name, id)
        }
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let members = if sub.get_flag("all") {
        list_all_members(conn)?
    } else {
        list_members(conn)?
    };
    if !maybe_print_json(sub.get_flag("json"), &members)? {
        let rows = members
            .into_iter()
            .map(|m| {
                let status = match m.removed_at {
                    Some(at) => format!("removed {}", at.format("%Y-%m-%d")),
                    None => "active".to_string(),
                };
                vec![
                    m.id.to_string(),
                    m.surname,
                    m.name,
                    m.external_ref.unwrap_or_default(),
                    status,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Surname", "Name", "Ref", "Status"], rows)
        );
    }
    Ok(())
}

fn import(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = arg_str(sub, "path")?;
    let candidates = parse_roster_file(Path::new(path), delimiter(sub)?)
        .with_context(|| format!("Read roster {}", path))?;
    let changed = import_roster(conn, &candidates)?;
    println!(
        "Imported {} of {} members from {}",
        changed,
        candidates.len(),
        path
    );
    Ok(())
}
