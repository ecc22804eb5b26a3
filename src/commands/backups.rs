// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::arg_str;
use crate::db::Store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result, bail};

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let backups = store.list_backups();
            if !maybe_print_json(sub.get_flag("json"), &backups)? {
                let rows = backups
                    .into_iter()
                    .map(|b| {
                        vec![
                            b.name,
                            b.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
                            format!("{:.1} KB", b.size as f64 / 1024.0),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Backup", "Modified", "Size"], rows));
            }
        }
        Some(("create", _)) => {
            let name = store.create_backup().context("Backup failed")?;
            println!("Backup written: {}", name);
        }
        Some(("restore", sub)) => {
            let name = arg_str(sub, "name")?;
            if !store.restore_backup(name) {
                store
                    .reopen()
                    .context("Restore failed and the database could not be reopened")?;
                bail!("Restore of '{}' failed; see system.log for details", name);
            }
            println!("Database restored from {}", name);
        }
        _ => {}
    }
    Ok(())
}
