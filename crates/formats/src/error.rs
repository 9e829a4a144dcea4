// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

use voxjob_core::OutputFormat;

/// Failure modes of the subtitle/transcript formatter (spec §4.5/§7). A
/// [`FormatError`] for one requested format never propagates past the
/// pipeline's per-format write loop — it is logged and that format is
/// skipped, per spec §4.3's failure-isolation rule.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("timestamp must be non-negative: {0}")]
    NegativeTimestamp(f64),

    #[error("failed to write {format} output: {reason}")]
    Write { format: OutputFormat, reason: String },

    #[error("failed to serialize transcript as json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;

impl From<FormatError> for voxjob_core::VoxJobError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::NegativeTimestamp(t) => Self::Validation(format!("timestamp must be non-negative: {t}")),
            FormatError::Write { format, reason } => Self::FormatWriteError { format: format.to_string(), reason },
            FormatError::Json(e) => Self::FormatWriteError { format: "json".to_string(), reason: e.to_string() },
        }
    }
}
