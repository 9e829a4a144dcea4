// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Queries against `jobs` and its `job_files` join table (spec §3/§4.6's
//! [`Job`] and job lifecycle).

use chrono::{DateTime, Utc};
use sqlx::Row;
use voxjob_core::{DiarizationConfig, Job, JobStatus, OutputFormat, PostprocessOptions, RecognitionParams, RecognizerKind};

use crate::error::{DbError, Result};
use crate::pool::DbPool;

struct JobRow {
    id: String,
    model_type: String,
    model_size: String,
    language: Option<String>,
    device: String,
    parameters: String,
    diarization_config: String,
    output_formats: String,
    force_alignment: bool,
    alignment_provider: Option<String>,
    postprocess: String,
    status: String,
    progress: i64,
    current_file: Option<String>,
    total_files: i64,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

fn parse_device(value: &str) -> Result<voxjob_core::Device> {
    match value {
        "cpu" => Ok(voxjob_core::Device::Cpu),
        "cuda" => Ok(voxjob_core::Device::Cuda),
        other => Err(DbError::InvalidEnum { kind: "Device", value: other.to_string() }),
    }
}

fn parse_status(value: &str) -> Result<JobStatus> {
    match value {
        "pending" => Ok(JobStatus::Pending),
        "processing" => Ok(JobStatus::Processing),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(DbError::InvalidEnum { kind: "JobStatus", value: other.to_string() }),
    }
}

fn row_to_job(row: JobRow, file_ids: Vec<String>) -> Result<Job> {
    let kind: RecognizerKind = row.model_type.parse().map_err(|_| DbError::InvalidEnum {
        kind: "RecognizerKind",
        value: row.model_type.clone(),
    })?;
    let parameters: RecognitionParams = serde_json::from_str(&row.parameters)?;
    let diarization: DiarizationConfig = serde_json::from_str(&row.diarization_config)?;
    let output_formats: Vec<OutputFormat> = serde_json::from_str(&row.output_formats)?;
    let postprocess: PostprocessOptions = serde_json::from_str(&row.postprocess)?;

    Ok(Job {
        id: row.id,
        kind,
        model_size: row.model_size,
        language: row.language,
        device: parse_device(&row.device)?,
        parameters,
        diarization,
        output_formats,
        force_alignment: row.force_alignment,
        alignment_provider: row.alignment_provider,
        postprocess,
        file_ids,
        status: parse_status(&row.status)?,
        progress: row.progress.clamp(0, 100) as u8,
        current_file: row.current_file,
        total_files: row.total_files.max(0) as u32,
        created_at: row.created_at,
        started_at: row.started_at,
        completed_at: row.completed_at,
        error_message: row.error_message,
    })
}

/// Persists a freshly-created job and its ordered file references, per spec
/// §4.5. Runs as a single transaction so a job never exists without its
/// `job_files` rows.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure, or
/// [`crate::DbError::Json`] if a JSON column fails to encode.
pub async fn insert_job(pool: &DbPool, job: &Job) -> Result<()> {
    let parameters = serde_json::to_string(&job.parameters)?;
    let diarization_config = serde_json::to_string(&job.diarization)?;
    let output_formats = serde_json::to_string(&job.output_formats)?;
    let postprocess = serde_json::to_string(&job.postprocess)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO jobs (id, model_type, model_size, language, device, parameters, diarization_config, \
         output_formats, force_alignment, alignment_provider, postprocess, status, progress, current_file, \
         total_files, created_at, started_at, completed_at, error_message) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&job.id)
    .bind(job.kind.as_str())
    .bind(&job.model_size)
    .bind(&job.language)
    .bind(job.device.to_string())
    .bind(parameters)
    .bind(diarization_config)
    .bind(output_formats)
    .bind(job.force_alignment)
    .bind(&job.alignment_provider)
    .bind(postprocess)
    .bind(job.status.to_string())
    .bind(i64::from(job.progress))
    .bind(&job.current_file)
    .bind(i64::from(job.total_files))
    .bind(job.created_at)
    .bind(job.started_at)
    .bind(job.completed_at)
    .bind(&job.error_message)
    .execute(&mut *tx)
    .await?;

    for (position, file_id) in job.file_ids.iter().enumerate() {
        #[allow(clippy::cast_possible_wrap)]
        let position = position as i64;
        sqlx::query("INSERT INTO job_files (job_id, file_id, position) VALUES (?, ?, ?)")
            .bind(&job.id)
            .bind(file_id)
            .bind(position)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Loads one job with its ordered file ids, or `None` if unknown.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure, or
/// [`crate::DbError::InvalidEnum`]/[`crate::DbError::Json`] if a stored
/// column fails to decode.
pub async fn get_job(pool: &DbPool, job_id: &str) -> Result<Option<Job>> {
    let Some(row) = sqlx::query(
        "SELECT id, model_type, model_size, language, device, parameters, diarization_config, output_formats, \
         force_alignment, alignment_provider, postprocess, status, progress, current_file, total_files, \
         created_at, started_at, completed_at, error_message FROM jobs WHERE id = ?",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let job_row = JobRow {
        id: row.get("id"),
        model_type: row.get("model_type"),
        model_size: row.get("model_size"),
        language: row.get("language"),
        device: row.get("device"),
        parameters: row.get("parameters"),
        diarization_config: row.get("diarization_config"),
        output_formats: row.get("output_formats"),
        force_alignment: row.get("force_alignment"),
        alignment_provider: row.get("alignment_provider"),
        postprocess: row.get("postprocess"),
        status: row.get("status"),
        progress: row.get("progress"),
        current_file: row.get("current_file"),
        total_files: row.get("total_files"),
        created_at: row.get("created_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        error_message: row.get("error_message"),
    };

    let file_rows = sqlx::query("SELECT file_id FROM job_files WHERE job_id = ? ORDER BY position ASC")
        .bind(job_id)
        .fetch_all(pool)
        .await?;
    let file_ids = file_rows.into_iter().map(|row| row.get("file_id")).collect();

    Ok(Some(row_to_job(job_row, file_ids)?))
}

/// Moves a job from `pending` to `processing`, stamping `started_at` once
/// (spec §8's "started_at is set exactly at the pending→processing
/// transition" invariant).
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn mark_processing(pool: &DbPool, job_id: &str, started_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE jobs SET status = 'processing', started_at = ? WHERE id = ? AND status = 'pending'")
        .bind(started_at)
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Updates progress and the file currently being processed, per spec §4.6's
/// per-file progress reporting.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn update_progress(pool: &DbPool, job_id: &str, progress: u8, current_file: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE jobs SET progress = ?, current_file = ? WHERE id = ?")
        .bind(i64::from(progress))
        .bind(current_file)
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks a job `completed`, per spec §4.6.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn mark_completed(pool: &DbPool, job_id: &str, completed_at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE jobs SET status = 'completed', progress = 100, current_file = NULL, completed_at = ? WHERE id = ?",
    )
    .bind(completed_at)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Marks a job `failed` with the given message, per spec §4.6.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn mark_failed(pool: &DbPool, job_id: &str, completed_at: DateTime<Utc>, error_message: &str) -> Result<()> {
    sqlx::query("UPDATE jobs SET status = 'failed', completed_at = ?, error_message = ? WHERE id = ?")
        .bind(completed_at)
        .bind(error_message)
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks a job `cancelled`, per spec §4.6/§9's cooperative cancellation.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn mark_cancelled(pool: &DbPool, job_id: &str, completed_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE jobs SET status = 'cancelled', completed_at = ? WHERE id = ?")
        .bind(completed_at)
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}
