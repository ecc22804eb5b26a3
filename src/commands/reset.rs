// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::Store;
use crate::ledger::reset_annual_data;
use anyhow::{Context, Result, bail};

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    if !m.get_flag("yes") {
        bail!("Reset deletes every purchase, quota and fund movement; re-run with --yes");
    }
    let snapshot = reset_annual_data(store).context("Annual reset failed")?;
    println!("Ledger cleared. Safety backup: {}", snapshot);
    Ok(())
}
