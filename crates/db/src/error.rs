// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

/// Failure modes of the persistence layer (spec §6/§7's `StorageError`).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to encode/decode json column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value {value:?} is not a valid {kind}")]
    InvalidEnum { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for voxjob_core::VoxJobError {
    fn from(e: DbError) -> Self {
        Self::Storage(e.to_string())
    }
}
