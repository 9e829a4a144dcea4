// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

/// Failure modes of the per-file transcription pipeline (spec §4.3/§7).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Recognizer(#[from] voxjob_recognizers::RecognizerError),

    #[error(transparent)]
    Registry(#[from] voxjob_registry::RegistryError),

    #[error(transparent)]
    Diarization(#[from] voxjob_diarize::DiarizationError),

    #[error("audio unreadable: {0}")]
    AudioUnreadable(String),

    #[error(transparent)]
    Db(#[from] voxjob_db::DbError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<PipelineError> for voxjob_core::VoxJobError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Recognizer(inner) => inner.into(),
            PipelineError::Registry(inner) => inner.into(),
            PipelineError::Diarization(inner) => inner.into(),
            PipelineError::AudioUnreadable(path) => Self::AudioUnreadable(path),
            PipelineError::Db(inner) => inner.into(),
            PipelineError::Io(e) => Self::Io(e),
        }
    }
}

/// Failure modes of the job lifecycle manager (spec §4.6/§7), the errors an
/// HTTP handler surfaces directly.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("unknown file: {0}")]
    UnknownFile(String),

    #[error("request referenced no files")]
    EmptyRequest,

    #[error(transparent)]
    Db(#[from] voxjob_db::DbError),
}

pub type JobResult<T> = std::result::Result<T, JobError>;

impl From<JobError> for voxjob_core::VoxJobError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::Validation(reason) => Self::Validation(reason),
            JobError::UnknownJob(id) => Self::UnknownJob(id),
            JobError::UnknownFile(id) => Self::UnknownFile(id),
            JobError::EmptyRequest => Self::Validation("request referenced no files".to_string()),
            JobError::Db(inner) => inner.into(),
        }
    }
}
