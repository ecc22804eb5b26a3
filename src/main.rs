// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::path::PathBuf;

use tesoreria::backup::DEFAULT_KEEP;
use tesoreria::db::{self, Store, StoreConfig};
use tesoreria::telemetry::{self, LogLevel};
use tesoreria::{cli, commands};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    let data_dir = match matches.get_one::<String>("data_dir") {
        Some(dir) => PathBuf::from(dir),
        None => db::data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Create data dir {}", data_dir.display()))?;

    let log_file = telemetry::open_log_file(&data_dir).ok();
    telemetry::init_subscriber(telemetry::get_subscriber("info", log_file))?;
    telemetry::log_system(LogLevel::Info, "Application starting");

    let mut config = StoreConfig::new(&data_dir);
    config.keep_backups = matches
        .get_one::<usize>("keep_backups")
        .copied()
        .unwrap_or(DEFAULT_KEEP);
    let mut store = Store::open(config)
        .with_context(|| format!("Open database in {}", data_dir.display()))?;

    let outcome = dispatch(&mut store, &matches);
    if let Err(e) = &outcome {
        telemetry::log_system(LogLevel::Error, &format!("{e:#}"));
    }
    store.close();
    outcome
}

fn dispatch(store: &mut Store, matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database ready at {}", store.db_path().display());
        }
        Some(("balance", sub)) => commands::balance::handle(store.conn()?, sub)?,
        Some(("member", sub)) => commands::members::handle(store.conn()?, sub)?,
        Some(("purchase", sub)) => commands::purchases::handle(store.conn_mut()?, sub)?,
        Some(("fund", sub)) => commands::fund::handle(store.conn()?, sub)?,
        Some(("backup", sub)) => commands::backups::handle(store, sub)?,
        Some(("statement", sub)) => commands::statement::handle(store.conn_mut()?, sub)?,
        Some(("export", sub)) => commands::exporter::handle(store.conn()?, sub)?,
        Some(("reset", sub)) => commands::reset::handle(store, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(store.conn()?)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
