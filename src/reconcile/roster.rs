// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Cell, find_header, normalized_row, read_rows};
use crate::error::{LedgerError, Result};
use crate::ledger::add_member;
use crate::models::MemberCandidate;
use crate::telemetry::{LogLevel, log_system_with};
use rusqlite::Connection;
use std::path::Path;

pub const SURNAME_HEADERS: &[&str] = &["COGNOME", "SURNAME"];
pub const NAME_HEADERS: &[&str] = &["NOME", "NAME"];
pub const TOTAL_MARKER: &str = "TOTAL";

fn field(row: &[Cell], idx: usize) -> Option<String> {
    row.get(idx)
        .filter(|c| !c.is_empty())
        .map(|c| c.text().trim().to_uppercase())
}

/// Read member candidates below the first row holding both a surname and a
/// name header, up to a totals row.
pub fn parse_roster(rows: &[Vec<Cell>]) -> Result<Vec<MemberCandidate>> {
    let mut columns: Option<(usize, usize)> = None;
    let mut out = Vec::new();
    for row in rows {
        let Some((surname_idx, name_idx)) = columns else {
            let norm = normalized_row(row);
            if let (Some(s), Some(n)) = (
                find_header(&norm, SURNAME_HEADERS),
                find_header(&norm, NAME_HEADERS),
            ) {
                columns = Some((s, n));
            }
            continue;
        };
        let (Some(surname), Some(name)) = (field(row, surname_idx), field(row, name_idx)) else {
            continue;
        };
        if surname.contains(TOTAL_MARKER) {
            break;
        }
        if surname.chars().count() < 2 || name.chars().count() < 2 {
            continue;
        }
        out.push(MemberCandidate { name, surname });
    }
    if columns.is_none() {
        return Err(LedgerError::MissingColumns {
            expected: "COGNOME (surname) and NOME (name)".to_string(),
        });
    }
    Ok(out)
}

pub fn parse_roster_file(path: &Path, delimiter: Option<u8>) -> Result<Vec<MemberCandidate>> {
    parse_roster(&read_rows(path, delimiter)?)
}

/// Register candidates, returning how many changed the registry (new or
/// reactivated members).
pub fn import_roster(conn: &Connection, candidates: &[MemberCandidate]) -> Result<usize> {
    let mut changed = 0;
    for c in candidates {
        changed += add_member(conn, &c.name, &c.surname, None)?.changes();
    }
    log_system_with(
        LogLevel::Action,
        "Roster imported",
        &(candidates.len(), changed),
    );
    Ok(changed)
}
