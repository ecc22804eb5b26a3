// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::line_total;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub external_ref: Option<String>,
    pub removed_at: Option<NaiveDateTime>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.name)
    }
}

/// Outcome of registering a member by (name, surname).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberOutcome {
    Inserted(i64),
    Reactivated(i64),
    AlreadyActive(i64),
}

impl MemberOutcome {
    pub fn id(&self) -> i64 {
        match *self {
            MemberOutcome::Inserted(id)
            | MemberOutcome::Reactivated(id)
            | MemberOutcome::AlreadyActive(id) => id,
        }
    }

    /// Rows affected, zero when an active duplicate already existed.
    pub fn changes(&self) -> usize {
        match self {
            MemberOutcome::AlreadyActive(_) => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseState {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub advance: Decimal,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub fund_expense: bool,
}

impl Purchase {
    pub fn state(&self) -> PurchaseState {
        if self.completed {
            PurchaseState::Completed
        } else {
            PurchaseState::Open
        }
    }
}

/// Input for creating or editing a purchase.
#[derive(Debug, Clone, Default)]
pub struct PurchaseDraft {
    pub name: String,
    pub unit_price: Decimal,
    pub advance: Decimal,
    /// Members to apportion the purchase to; `None` means every active member.
    pub members: Option<Vec<i64>>,
    pub fund_expense: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub id: i64,
    pub purchase_id: i64,
    pub member_id: i64,
    pub quantity: i64,
    pub amount_paid: Decimal,
}

/// A quota joined with the owning member, as shown in a purchase sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaDetail {
    pub id: i64,
    pub purchase_id: i64,
    pub member_id: i64,
    pub quantity: i64,
    pub amount_paid: Decimal,
    pub name: String,
    pub surname: String,
    pub external_ref: Option<String>,
}

impl QuotaDetail {
    pub fn amount_owed(&self, unit_price: Decimal) -> Result<Decimal> {
        line_total(self.quantity, unit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Debtor {
    pub quota_id: i64,
    pub member_id: i64,
    pub surname: String,
    pub name: String,
    pub external_ref: Option<String>,
    pub due: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMovement {
    pub id: i64,
    pub amount: Decimal,
    pub description: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JournalSource {
    Manual,
    SupplierPayment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub source: JournalSource,
    pub ref_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GlobalBalance {
    pub real_cash: Decimal,
    pub restricted_funds: Decimal,
    pub available_cash: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub name: String,
    pub modified: DateTime<Local>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCandidate {
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementMatch {
    pub source_line: String,
    pub member_id: i64,
    pub display_name: String,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub confidence: String,
}
