// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Tabular imports: bank statements matched against members, and member
//! rosters. Everything here only proposes; writes go through the ledger.

pub mod roster;
pub mod statement;

use crate::error::{LedgerError, Result};
use chrono::{Days, NaiveDate};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fs;
use std::io;
use std::path::Path;

/// A decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(d) => d.to_string(),
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

pub type Rows = Vec<Vec<Cell>>;

/// Uppercase, collapse whitespace, keep only `[A-Z0-9 ]`, trim.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.to_uppercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            out.push(c);
        }
    }
    out.trim().to_string()
}

/// Parse an amount written with `,` as decimal separator and `.` for
/// thousands (`1.234,56`). Plain `1234.56` is accepted too. Anything
/// unparseable is zero.
pub fn parse_amount(cell: &Cell) -> Decimal {
    match cell {
        Cell::Number(d) => *d,
        Cell::Text(s) => parse_amount_text(s),
        Cell::Empty | Cell::Date(_) => Decimal::ZERO,
    }
}

fn parse_amount_text(s: &str) -> Decimal {
    let mut cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£'))
        .collect();
    if cleaned.contains(',') {
        cleaned = cleaned.replace('.', "").replacen(',', ".", 1);
    }
    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

fn leading_int(s: &str) -> Option<i64> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Best-effort date from a cell: spreadsheet serial numbers, `DD/MM/YYYY` or
/// `YYYY-MM-DD`.
pub fn parse_date_hint(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => {
            let days = n.trunc().to_u64()?;
            NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))
        }
        Cell::Text(s) => {
            let s = s.trim();
            let (sep, day_first) = if s.contains('/') {
                ('/', true)
            } else if s.contains('-') {
                ('-', false)
            } else {
                return None;
            };
            let parts: Vec<&str> = s.split(sep).collect();
            if parts.len() != 3 {
                return None;
            }
            let (d, m, y) = if day_first {
                (parts[0], parts[1], parts[2])
            } else {
                (parts[2], parts[1], parts[0])
            };
            NaiveDate::from_ymd_opt(
                leading_int(y)? as i32,
                leading_int(m)? as u32,
                leading_int(d)? as u32,
            )
        }
        Cell::Empty => None,
    }
}

#[cfg(windows)]
const LOCK_CODES: [i32; 2] = [32, 33]; // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
#[cfg(not(windows))]
const LOCK_CODES: [i32; 1] = [16]; // EBUSY

/// Map an I/O failure on `path`, turning "file in use" into a user-actionable
/// error.
pub fn classify_io(path: &Path, e: io::Error) -> LedgerError {
    let locked = e.kind() == io::ErrorKind::PermissionDenied
        || e.raw_os_error().is_some_and(|code| LOCK_CODES.contains(&code));
    if locked {
        LedgerError::FileLocked(path.to_path_buf())
    } else {
        LedgerError::Io(e)
    }
}

/// Pick `;` when the first line has more semicolons than commas.
pub fn sniff_delimiter(data: &[u8]) -> u8 {
    let first = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let semis = first.iter().filter(|b| **b == b';').count();
    let commas = first.iter().filter(|b| **b == b',').count();
    if semis > commas { b';' } else { b',' }
}

/// Read a delimited export into rows of cells. The file is read fully into
/// memory first so no lock is held while parsing.
pub fn read_rows(path: &Path, delimiter: Option<u8>) -> Result<Rows> {
    let data = fs::read(path).map_err(|e| classify_io(path, e))?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&data));
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data.as_slice());
    let mut rows = Vec::new();
    for rec in rdr.byte_records() {
        let rec = rec?;
        rows.push(
            rec.iter()
                .map(|field| Cell::from(String::from_utf8_lossy(field).as_ref()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Position of the first cell equal to any of `tokens`, in token priority order.
fn find_header(normalized: &[String], tokens: &[&str]) -> Option<usize> {
    tokens
        .iter()
        .find_map(|t| normalized.iter().position(|c| c == t))
}

fn normalized_row(row: &[Cell]) -> Vec<String> {
    row.iter().map(|c| normalize(&c.text())).collect()
}
