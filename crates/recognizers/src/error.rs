// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

/// Failure modes of the recognizer adapter interface (spec §4.1/§7).
#[derive(Debug, Error, Clone)]
pub enum RecognizerError {
    /// The recognizer kind is compiled in but disabled by configuration
    /// (e.g. a cloud provider without credentials).
    #[error("backend disabled: {0}")]
    BackendDisabled(String),

    /// A required dependency, container, or credential is missing.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The recognizer's configuration (size, device, params) is invalid for
    /// this kind.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Loading weights or starting the backend process failed.
    #[error("model load failed: {0}")]
    ModelLoadError(String),

    /// The input audio could not be read or decoded.
    #[error("audio unreadable: {0}")]
    AudioUnreadable(String),

    /// A plausibly transient failure (timeout, connection reset); eligible
    /// for retry with backoff at the pipeline layer.
    #[error("transient backend error: {0}")]
    BackendTransient(String),

    /// A permanent failure (malformed output, non-JSON stdout, non-zero
    /// exit with no retry value).
    #[error("permanent backend error: {0}")]
    BackendPermanent(String),
}

pub type Result<T> = std::result::Result<T, RecognizerError>;

impl From<RecognizerError> for voxjob_core::VoxJobError {
    fn from(e: RecognizerError) -> Self {
        match e {
            RecognizerError::BackendDisabled(reason) => Self::BackendDisabled(reason),
            RecognizerError::BackendUnavailable(reason) => Self::BackendUnavailable(reason),
            RecognizerError::ConfigInvalid(reason) => Self::Validation(reason),
            RecognizerError::ModelLoadError(reason) => Self::ModelLoadError { kind: "recognizer".to_string(), reason },
            RecognizerError::AudioUnreadable(path) => Self::AudioUnreadable(path),
            RecognizerError::BackendTransient(reason) => {
                Self::BackendTransient { reason, attempt: 0, max_attempts: 0 }
            },
            RecognizerError::BackendPermanent(reason) => Self::BackendPermanent(reason),
        }
    }
}
