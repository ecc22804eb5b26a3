// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Purchase {0} is completed and can no longer be modified")]
    PurchaseCompleted(i64),

    #[error("Database is not open")]
    StoreClosed,

    #[error("The file {} is open in another program. Close it and retry.", .0.display())]
    FileLocked(PathBuf),

    #[error("Could not find the expected columns: {expected}")]
    MissingColumns { expected: String },

    #[error("Restore failed: {0}")]
    Restore(String),

    #[error("Amount out of range while computing {0}")]
    Overflow(&'static str),

    #[error("Invalid stored value: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
