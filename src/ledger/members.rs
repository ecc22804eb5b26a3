// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::models::{Member, MemberOutcome};
use crate::telemetry::{LogLevel, log_system_with};
use crate::utils::now;
use rusqlite::{Connection, OptionalExtension, Row, params};

const MEMBER_COLUMNS: &str = "id, name, surname, external_ref, removed_at";

fn member_from_row(r: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: r.get(0)?,
        name: r.get(1)?,
        surname: r.get(2)?,
        external_ref: r.get(3)?,
        removed_at: r.get(4)?,
    })
}

fn clean_names(name: &str, surname: &str) -> Result<(String, String)> {
    let name = name.trim();
    let surname = surname.trim();
    if name.is_empty() || surname.is_empty() {
        return Err(LedgerError::validation("Name and surname are required"));
    }
    Ok((name.to_string(), surname.to_string()))
}

fn clean_ref(external_ref: Option<&str>) -> Option<String> {
    external_ref
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Register a member, keyed by (name, surname).
///
/// A soft-deleted namesake is reactivated in place; an active one is left
/// untouched.
pub fn add_member(
    conn: &Connection,
    name: &str,
    surname: &str,
    external_ref: Option<&str>,
) -> Result<MemberOutcome> {
    let (name, surname) = clean_names(name, surname)?;
    let external_ref = clean_ref(external_ref);

    let existing: Option<(i64, bool)> = conn
        .query_row(
            "SELECT id, removed_at IS NOT NULL FROM members WHERE name=?1 AND surname=?2
             ORDER BY removed_at IS NOT NULL, id LIMIT 1",
            params![&name, &surname],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    let outcome = match existing {
        Some((id, false)) => MemberOutcome::AlreadyActive(id),
        Some((id, true)) => {
            conn.execute(
                "UPDATE members SET removed_at = NULL, external_ref = ?1 WHERE id = ?2",
                params![external_ref, id],
            )?;
            MemberOutcome::Reactivated(id)
        }
        None => {
            conn.execute(
                "INSERT INTO members(name, surname, external_ref) VALUES (?1, ?2, ?3)",
                params![&name, &surname, external_ref],
            )?;
            MemberOutcome::Inserted(conn.last_insert_rowid())
        }
    };
    if outcome.changes() > 0 {
        log_system_with(
            LogLevel::Action,
            "Member registered",
            &(outcome, &surname, &name),
        );
    }
    Ok(outcome)
}

pub fn update_member(
    conn: &Connection,
    id: i64,
    name: &str,
    surname: &str,
    external_ref: Option<&str>,
) -> Result<()> {
    let (name, surname) = clean_names(name, surname)?;
    let n = conn.execute(
        "UPDATE members SET name = ?1, surname = ?2, external_ref = ?3 WHERE id = ?4",
        params![name, surname, clean_ref(external_ref), id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound { entity: "Member", id });
    }
    Ok(())
}

/// Mark a member as removed. Quotas and history stay in place.
pub fn soft_delete_member(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute(
        "UPDATE members SET removed_at = COALESCE(removed_at, ?1) WHERE id = ?2",
        params![now(), id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound { entity: "Member", id });
    }
    log_system_with(LogLevel::Action, "Member removed", &id);
    Ok(())
}

/// Soft delete every active member, returning how many were removed.
pub fn soft_delete_all_active_members(conn: &Connection) -> Result<usize> {
    let n = conn.execute(
        "UPDATE members SET removed_at = ?1 WHERE removed_at IS NULL",
        params![now()],
    )?;
    log_system_with(LogLevel::Action, "All members removed", &n);
    Ok(n)
}

pub fn get_member(conn: &Connection, id: i64) -> Result<Member> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
        params![id],
        member_from_row,
    )
    .optional()?
    .ok_or(LedgerError::NotFound { entity: "Member", id })
}

/// Active members ordered by surname.
pub fn list_members(conn: &Connection) -> Result<Vec<Member>> {
    query_members(conn, "WHERE removed_at IS NULL")
}

/// Every member ever registered, removed ones included.
pub fn list_all_members(conn: &Connection) -> Result<Vec<Member>> {
    query_members(conn, "")
}

fn query_members(conn: &Connection, filter: &str) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members {filter} ORDER BY surname, name, id"
    ))?;
    let rows = stmt.query_map([], member_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
