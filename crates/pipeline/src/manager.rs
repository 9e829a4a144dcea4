// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The job lifecycle manager of spec §4.6: validates and persists jobs,
//! drives them through the state machine via a bounded background pool, and
//! exposes read-only status/result projections.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;
use voxjob_core::{
    DiarizationConfig, Device, Job, JobStatus, OutputFormat, PostprocessOptions, RecognitionParams, RecognizerKind,
    TranscriptResult,
};
use voxjob_db::DbPool;
use voxjob_diarize::{ClusteringParams, EmbeddingExtractor};
use voxjob_formats::WriteOptions;
use voxjob_recognizers::Aligner;
use voxjob_registry::Registry;

use crate::error::{JobError, JobResult, Result};
use crate::storage::StorageLayout;
use crate::transcribe::{run_file, RetryPolicy};

/// The validated input to [`create_job`], already past HTTP-layer parsing.
pub struct CreateJobRequest {
    pub kind: RecognizerKind,
    pub model_size: String,
    pub language: Option<String>,
    pub device: Device,
    pub parameters: RecognitionParams,
    pub diarization: DiarizationConfig,
    pub output_formats: Vec<OutputFormat>,
    pub force_alignment: bool,
    pub alignment_provider: Option<String>,
    pub postprocess: PostprocessOptions,
    pub file_ids: Vec<String>,
}

/// Dependencies a background [`run_job`] task needs, cloned once per spawn so
/// the task owns its own persistence handle rather than sharing a
/// request-scoped one (spec §9's "Background work" note).
#[derive(Clone)]
pub struct JobRuntime {
    pub db: DbPool,
    pub registry: Arc<Registry>,
    pub embedding_extractor: Arc<dyn EmbeddingExtractor>,
    pub aligner: Arc<dyn Aligner>,
    pub storage: StorageLayout,
    pub write_options: WriteOptions,
    pub clustering_params: ClusteringParams,
    pub retry_policy: RetryPolicy,
    pub job_semaphore: Arc<Semaphore>,
}

/// Validates and persists a new job in `pending`, per spec §4.6's
/// `create_job`. Does not itself start the background worker — callers
/// follow up with [`spawn_run_job`].
///
/// # Errors
///
/// Returns [`JobError::EmptyRequest`] for a zero-file request,
/// [`JobError::UnknownFile`] for the first file id that does not resolve, or
/// [`JobError::Db`] on a database failure.
pub async fn create_job(db: &DbPool, request: CreateJobRequest) -> JobResult<Job> {
    if request.file_ids.is_empty() {
        return Err(JobError::EmptyRequest);
    }

    let missing = voxjob_db::files::missing_file_ids(db, &request.file_ids).await?;
    if let Some(file_id) = missing.into_iter().next() {
        return Err(JobError::UnknownFile(file_id));
    }

    let total_files = request.file_ids.len() as u32;
    let job = Job {
        id: Uuid::new_v4().to_string(),
        kind: request.kind,
        model_size: request.model_size,
        language: request.language,
        device: request.device,
        parameters: request.parameters,
        diarization: request.diarization,
        output_formats: request.output_formats,
        force_alignment: request.force_alignment,
        alignment_provider: request.alignment_provider,
        postprocess: request.postprocess,
        file_ids: request.file_ids,
        status: JobStatus::Pending,
        progress: 0,
        current_file: None,
        total_files,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
        error_message: None,
    };

    voxjob_db::jobs::insert_job(db, &job).await?;
    Ok(job)
}

/// Enqueues [`run_job`] on the tokio runtime and returns immediately, per
/// spec §9: the API surface must not block on job execution. Concurrency is
/// bounded by `runtime.job_semaphore` (spec §5's default-3 worker pool) —
/// jobs beyond the limit simply wait in `pending`.
pub fn spawn_run_job(runtime: JobRuntime, job_id: String) {
    tokio::spawn(async move {
        if let Err(e) = run_job(&runtime, &job_id).await {
            tracing::error!(job_id = %job_id, error = %e, "job execution failed");
        }
    });
}

/// Drives one job through the per-file pipeline of spec §4.3 to a terminal
/// state, per spec §4.6's `run_job`. Acquires a worker-pool permit before
/// leaving `pending`; files are processed strictly in file-id order and a
/// single file failure fails the whole job (spec §4.3's fail-fast rule).
/// Checks for a cooperative cancellation request between files (spec §5).
///
/// # Errors
///
/// Returns [`crate::error::PipelineError`] only for infrastructure failures
/// (database, filesystem) that leave the job's recorded state ambiguous; a
/// recognizer/diarization failure on a file is instead persisted onto the
/// job as `failed` and returned as `Ok(())`.
pub async fn run_job(runtime: &JobRuntime, job_id: &str) -> Result<()> {
    let _permit = runtime.job_semaphore.acquire().await.expect("job semaphore is never closed");

    let Some(job) = voxjob_db::jobs::get_job(&runtime.db, job_id).await? else {
        tracing::warn!(job_id, "run_job: job vanished before dispatch");
        return Ok(());
    };
    if job.status != JobStatus::Pending {
        return Ok(());
    }

    voxjob_db::jobs::mark_processing(&runtime.db, job_id, Utc::now()).await?;

    let results_dir = runtime.storage.results_dir(job_id);
    let total = u64::from(job.total_files.max(1));

    for (index, file_id) in job.file_ids.iter().enumerate() {
        if job_is_cancelled(&runtime.db, job_id).await? {
            return Ok(());
        }

        let Some(file) = voxjob_db::files::get_file(&runtime.db, file_id).await? else {
            fail_job(runtime, job_id, &format!("uploaded file vanished: {file_id}")).await?;
            return Ok(());
        };

        #[allow(clippy::cast_possible_truncation)]
        let progress = ((index as u64 * 100) / total) as u8;
        voxjob_db::jobs::update_progress(&runtime.db, job_id, progress, Some(&file.original_filename)).await?;

        let outcome = run_file(
            &runtime.registry,
            runtime.embedding_extractor.as_ref(),
            runtime.aligner.as_ref(),
            &job,
            &file,
            &results_dir,
            &runtime.write_options,
            runtime.clustering_params,
            runtime.retry_policy,
        )
        .await;

        match outcome {
            Ok(outcome) => {
                let result = TranscriptResult {
                    id: Uuid::new_v4().to_string(),
                    job_id: job_id.to_string(),
                    file_id: file_id.clone(),
                    segment_count: outcome.segment_count,
                    speaker_count: outcome.speaker_count,
                    paths: outcome.paths,
                    created_at: Utc::now(),
                };
                voxjob_db::results::insert_result(&runtime.db, &result).await?;
            },
            Err(e) => {
                fail_job(runtime, job_id, &e.to_string()).await?;
                return Ok(());
            },
        }
    }

    voxjob_db::jobs::mark_completed(&runtime.db, job_id, Utc::now()).await?;
    Ok(())
}

async fn job_is_cancelled(db: &DbPool, job_id: &str) -> Result<bool> {
    Ok(voxjob_db::jobs::get_job(db, job_id).await?.is_some_and(|job| job.status == JobStatus::Cancelled))
}

async fn fail_job(runtime: &JobRuntime, job_id: &str, message: &str) -> Result<()> {
    tracing::warn!(job_id, error = message, "job failed");
    voxjob_db::jobs::mark_failed(&runtime.db, job_id, Utc::now(), message).await?;
    Ok(())
}

/// Read-only projection of a job, per spec §4.6's `get_job`.
///
/// # Errors
///
/// Returns [`JobError::UnknownJob`] if the job does not exist, or
/// [`JobError::Db`] on a database failure.
pub async fn get_job(db: &DbPool, job_id: &str) -> JobResult<Job> {
    voxjob_db::jobs::get_job(db, job_id).await?.ok_or_else(|| JobError::UnknownJob(job_id.to_string()))
}

/// Requests cancellation, per spec §4.6: effective only from `pending` or
/// `processing`. The running [`run_job`] task observes it at the next
/// between-files checkpoint and does not interrupt mid-file (spec §5/§9's
/// "not interrupting mid-file" resolution). A no-op if the job is already
/// terminal.
///
/// # Errors
///
/// Returns [`JobError::UnknownJob`] if the job does not exist, or
/// [`JobError::Db`] on a database failure.
pub async fn cancel(db: &DbPool, job_id: &str) -> JobResult<()> {
    let job = get_job(db, job_id).await?;
    if job.status.is_terminal() {
        return Ok(());
    }
    voxjob_db::jobs::mark_cancelled(db, job_id, Utc::now()).await?;
    Ok(())
}

/// Every per-file result row for a completed job, the data backing
/// `GET /api/v1/results/{job_id}`'s summary. `None` if the job has not
/// reached `completed` yet, per spec §6.
///
/// # Errors
///
/// Returns [`JobError::UnknownJob`] if the job does not exist, or
/// [`JobError::Db`] on a database failure.
pub async fn get_results_summary(db: &DbPool, job_id: &str) -> JobResult<Option<Vec<TranscriptResult>>> {
    let job = get_job(db, job_id).await?;
    if job.status != JobStatus::Completed {
        return Ok(None);
    }
    Ok(Some(voxjob_db::results::results_for_job(db, job_id).await?))
}

/// The outcome of looking up a result artifact for
/// `GET /api/v1/results/{job_id}/{format}`, distinguishing "job has not
/// reached `completed` yet" from "the job completed but did not produce
/// this format" — spec.md:196 maps these to 400 and 404 respectively, and
/// spec §8 scenario 5 names the 404 case explicitly ("only `vtt` was
/// requested").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLookup {
    NotCompleted,
    NotProduced,
    Found(String),
}

/// The on-disk path of the first file's artifact in `format`, the data
/// backing `GET /api/v1/results/{job_id}/{format}` (spec §6/§8 scenario 5:
/// "returns the first file's VTT").
///
/// # Errors
///
/// Returns [`JobError::UnknownJob`] if the job does not exist, or
/// [`JobError::Db`] on a database failure.
pub async fn get_result_path(db: &DbPool, job_id: &str, format: OutputFormat) -> JobResult<ResultLookup> {
    let job = get_job(db, job_id).await?;
    if job.status != JobStatus::Completed {
        return Ok(ResultLookup::NotCompleted);
    }
    let results = voxjob_db::results::results_for_job(db, job_id).await?;
    Ok(results
        .into_iter()
        .find_map(|result| result.paths.get(&format).cloned())
        .map_or(ResultLookup::NotProduced, ResultLookup::Found))
}
