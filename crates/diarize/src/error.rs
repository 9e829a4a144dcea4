// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DiarizationError {
    #[error("audio at {0} could not be read")]
    AudioUnreadable(String),

    #[error("embedding extraction failed: {0}")]
    EmbeddingFailed(String),

    #[error("diarization produced {produced} labels for {expected} segments")]
    Mismatch { expected: usize, produced: usize },
}

pub type Result<T> = std::result::Result<T, DiarizationError>;

impl From<DiarizationError> for voxjob_core::VoxJobError {
    fn from(e: DiarizationError) -> Self {
        match e {
            DiarizationError::AudioUnreadable(path) => Self::AudioUnreadable(path),
            DiarizationError::EmbeddingFailed(reason) => Self::BackendPermanent(reason),
            DiarizationError::Mismatch { expected, produced } => {
                Self::DiarizationMismatch { segments: expected, labels: produced }
            },
        }
    }
}
