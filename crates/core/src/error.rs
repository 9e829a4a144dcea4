// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for VoxJob.
//!
//! One enum covers every failure domain named in the job service
//! specification; each HTTP-facing crate maps these variants onto status
//! codes at its own boundary rather than inventing a parallel taxonomy.

use thiserror::Error;

/// Convenience type alias for Results using `VoxJobError`.
pub type Result<T> = std::result::Result<T, VoxJobError>;

/// Every way a transcription job can fail, from request validation through
/// backend invocation to on-disk persistence.
#[derive(Debug, Error)]
pub enum VoxJobError {
    /// The request itself was malformed: unknown recognizer kind, an
    /// out-of-range parameter, too many files, an unsupported output format.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A job id referenced by the caller does not exist.
    #[error("unknown job: {0}")]
    UnknownJob(String),

    /// A file id referenced by the caller does not exist.
    #[error("unknown file: {0}")]
    UnknownFile(String),

    /// The requested recognizer kind is compiled in but disabled by
    /// configuration (e.g. a cloud provider without credentials).
    #[error("backend disabled: {0}")]
    BackendDisabled(String),

    /// The requested recognizer kind has no adapter available in this build
    /// (feature not compiled, subprocess binary not found).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Loading a recognizer's weights/process failed.
    #[error("model load failed for {kind}: {reason}")]
    ModelLoadError { kind: String, reason: String },

    /// A recognizer invocation failed in a way that is plausibly transient
    /// (timeout, connection reset) and eligible for retry with backoff.
    #[error("backend transient error ({attempt}/{max_attempts}): {reason}")]
    BackendTransient {
        reason: String,
        attempt: u32,
        max_attempts: u32,
    },

    /// A recognizer invocation failed permanently (malformed stdout,
    /// non-JSON output, non-zero exit with no retry value).
    #[error("backend permanent error: {0}")]
    BackendPermanent(String),

    /// The input audio could not be read or decoded.
    #[error("audio unreadable: {0}")]
    AudioUnreadable(String),

    /// Diarization produced a label count that does not match the segment
    /// count it was asked to label.
    #[error("diarization mismatch: {segments} segments but {labels} labels")]
    DiarizationMismatch { segments: usize, labels: usize },

    /// A subtitle/transcript writer failed to produce its output file.
    #[error("failed to write {format} output: {reason}")]
    FormatWriteError { format: String, reason: String },

    /// Persistence (sqlite) or filesystem storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A bounded wait (worker pool acquisition, backend call) exceeded its
    /// deadline.
    #[error("timeout exceeded: {0}")]
    TimeoutExceeded(String),

    /// Catch-all for I/O failures not otherwise classified above.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Backward-compatible string conversions, kept in the teacher's style for
// call sites that only have a message and no structured variant to reach for.
impl From<String> for VoxJobError {
    fn from(s: String) -> Self {
        Self::Validation(s)
    }
}

impl From<&str> for VoxJobError {
    fn from(s: &str) -> Self {
        Self::Validation(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoxJobError::UnknownJob("abc-123".to_string());
        assert_eq!(err.to_string(), "unknown job: abc-123");

        let err = VoxJobError::DiarizationMismatch {
            segments: 10,
            labels: 7,
        };
        assert_eq!(
            err.to_string(),
            "diarization mismatch: 10 segments but 7 labels"
        );
    }

    #[test]
    fn test_string_to_error_conversion() {
        let err: VoxJobError = "bad request".into();
        assert!(matches!(err, VoxJobError::Validation(ref s) if s == "bad request"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VoxJobError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_transient_error_carries_attempt_counters() {
        let err = VoxJobError::BackendTransient {
            reason: "connection reset".to_string(),
            attempt: 2,
            max_attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "backend transient error (2/3): connection reset"
        );
    }
}
