// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::get_global_balance;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let balance = get_global_balance(conn)?;
    if !maybe_print_json(m.get_flag("json"), &balance)? {
        let rows = vec![
            vec!["Real cash".to_string(), fmt_money(&balance.real_cash)],
            vec![
                "Restricted funds".to_string(),
                fmt_money(&balance.restricted_funds),
            ],
            vec![
                "Available cash".to_string(),
                fmt_money(&balance.available_cash),
            ],
        ];
        println!("{}", pretty_table(&["Fund", "Amount"], rows));
    }
    Ok(())
}
