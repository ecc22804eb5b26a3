// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Cell, find_header, normalize, normalized_row, parse_amount, parse_date_hint, read_rows};
use crate::error::Result;
use crate::ledger::{get_purchase, quota_for_member, update_quota};
use crate::ledger::purchases::ensure_open;
use crate::models::{Member, StatementMatch};
use crate::telemetry::{LogLevel, log_system_with};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::Path;

pub const AMOUNT_HEADERS: &[&str] = &["AVERE", "ACCREDITI", "ENTRATE", "CREDIT"];
pub const DESCRIPTION_HEADERS: &[&str] = &["DESCRIZIONE", "CAUSALE", "DESCRIPTION"];
pub const DATE_HEADERS: &[&str] = &["DATA", "OPERAZIONE", "DATE"];

/// Header rows are only looked for this far down.
pub const HEADER_SCAN_ROWS: usize = 20;

/// Credits at or below one cent are rounding noise.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const SOURCE_LINE_MAX: usize = 80;
pub const CONFIDENCE_FULL_NAME: &str = "Name+Surname";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub amount: usize,
    pub description: usize,
    pub date: usize,
}

/// Column layout used when no header is recognised.
pub const FALLBACK_COLUMNS: Columns = Columns {
    amount: 3,
    description: 6,
    date: 1,
};

pub fn detect_columns(rows: &[Vec<Cell>]) -> Columns {
    let mut amount = None;
    let mut description = None;
    let mut date = None;
    for row in rows.iter().take(HEADER_SCAN_ROWS) {
        let norm = normalized_row(row);
        amount = find_header(&norm, AMOUNT_HEADERS).or(amount);
        description = find_header(&norm, DESCRIPTION_HEADERS).or(description);
        date = find_header(&norm, DATE_HEADERS).or(date);
        if amount.is_some() && description.is_some() {
            break;
        }
    }
    Columns {
        amount: amount.unwrap_or(FALLBACK_COLUMNS.amount),
        description: description.unwrap_or(FALLBACK_COLUMNS.description),
        date: date.unwrap_or(FALLBACK_COLUMNS.date),
    }
}

fn source_line(description: &str) -> String {
    if description.chars().count() > SOURCE_LINE_MAX {
        let head: String = description.chars().take(SOURCE_LINE_MAX).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

/// Propose one member per credited row whose description contains both the
/// member's name and surname. The first matching member wins.
pub fn match_statement(rows: &[Vec<Cell>], members: &[Member]) -> Vec<StatementMatch> {
    let cols = detect_columns(rows);
    let keys: Vec<(&Member, String, String)> = members
        .iter()
        .map(|m| (m, normalize(&m.name), normalize(&m.surname)))
        .filter(|(_, name, surname)| name.len() > 2 && surname.len() > 2)
        .collect();

    let mut out = Vec::new();
    for row in rows {
        if row.len() < 3 {
            continue;
        }
        let Some(amount_cell) = row.get(cols.amount).filter(|c| !c.is_empty()) else {
            continue;
        };
        let amount = parse_amount(amount_cell);
        if amount <= MIN_AMOUNT {
            continue;
        }
        let description = match row.get(cols.description).filter(|c| !c.is_empty()) {
            Some(cell) => cell.text(),
            None => row.iter().map(Cell::text).collect::<Vec<_>>().join(" "),
        };
        let haystack = normalize(&description);
        let found = keys
            .iter()
            .find(|(_, name, surname)| haystack.contains(name.as_str()) && haystack.contains(surname.as_str()));
        if let Some((member, _, _)) = found {
            out.push(StatementMatch {
                source_line: source_line(&description),
                member_id: member.id,
                display_name: member.display_name(),
                amount,
                date: row.get(cols.date).and_then(parse_date_hint),
                confidence: CONFIDENCE_FULL_NAME.to_string(),
            });
        }
    }
    out
}

pub fn match_statement_file(
    path: &Path,
    delimiter: Option<u8>,
    members: &[Member],
) -> Result<Vec<StatementMatch>> {
    let rows = read_rows(path, delimiter)?;
    let matches = match_statement(&rows, members);
    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        matches = matches.len(),
        "statement analysed"
    );
    Ok(matches)
}

/// Record confirmed matches as payments on `purchase_id`, in one transaction.
///
/// Each match overwrites the amount paid on the member's quota. Matches for
/// members without a quota on this purchase are skipped. Returns how many
/// quotas were written.
pub fn apply_matches(
    conn: &mut Connection,
    purchase_id: i64,
    confirmed: &[StatementMatch],
) -> Result<usize> {
    ensure_open(&get_purchase(conn, purchase_id)?)?;
    let tx = conn.transaction()?;
    let mut applied = 0;
    for m in confirmed {
        match quota_for_member(&tx, purchase_id, m.member_id)? {
            Some(quota) => {
                update_quota(&tx, quota.id, quota.quantity, m.amount)?;
                applied += 1;
            }
            None => {
                tracing::debug!(member = m.member_id, purchase = purchase_id, "no quota for match")
            }
        }
    }
    tx.commit()?;
    log_system_with(
        LogLevel::Action,
        "Statement payments applied",
        &(purchase_id, applied),
    );
    Ok(applied)
}
