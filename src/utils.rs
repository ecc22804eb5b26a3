// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result as LedgerResult};
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

/// Current UTC time, second precision, as persisted in the store.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

/// Parse a comma separated id list such as `3,5,8`.
pub fn parse_id_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(parse_id)
        .collect()
}

/// Decode a decimal persisted as TEXT.
pub fn stored_decimal(s: &str) -> LedgerResult<Decimal> {
    s.parse::<Decimal>()
        .map_err(|_| LedgerError::Corrupt(format!("'{}' is not a decimal", s)))
}

/// `quantity × unit_price`, failing instead of overflowing.
pub fn line_total(quantity: i64, unit_price: Decimal) -> LedgerResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or(LedgerError::Overflow("quantity × unit price"))
}

/// Checked running sum for aggregates.
pub fn accumulate(total: &mut Decimal, amount: Decimal, what: &'static str) -> LedgerResult<()> {
    *total = total.checked_add(amount).ok_or(LedgerError::Overflow(what))?;
    Ok(())
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("€ {:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}
