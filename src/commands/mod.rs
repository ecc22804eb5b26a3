// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod backups;
pub mod balance;
pub mod doctor;
pub mod exporter;
pub mod fund;
pub mod members;
pub mod purchases;
pub mod reset;
pub mod statement;

use anyhow::{Context, Result};

pub(crate) fn arg_str<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .with_context(|| format!("Missing --{}", name.replace('_', "-")))
}

pub(crate) fn opt_str<'a>(m: &'a clap::ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

pub(crate) fn delimiter(m: &clap::ArgMatches) -> Result<Option<u8>> {
    match opt_str(m, "delimiter") {
        None => Ok(None),
        Some(d) if d.len() == 1 => Ok(Some(d.as_bytes()[0])),
        Some(d) => anyhow::bail!("Delimiter must be a single character, got '{}'", d),
    }
}
