// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Queries against `results` (spec §3's [`TranscriptResult`]).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::Row;
use voxjob_core::{OutputFormat, TranscriptResult};

use crate::error::Result;
use crate::pool::DbPool;

struct ResultRow {
    id: String,
    job_id: String,
    file_id: String,
    segment_count: i64,
    speaker_count: Option<i64>,
    paths: String,
    created_at: DateTime<Utc>,
}

fn row_to_result(row: ResultRow) -> Result<TranscriptResult> {
    let paths: BTreeMap<OutputFormat, String> = serde_json::from_str(&row.paths)?;
    Ok(TranscriptResult {
        id: row.id,
        job_id: row.job_id,
        file_id: row.file_id,
        segment_count: row.segment_count.max(0) as u32,
        speaker_count: row.speaker_count.map(|n| n.max(0) as u32),
        paths,
        created_at: row.created_at,
    })
}

/// Persists one `(Job, File)` result row, per spec §4.5's "one result per
/// input file" rule.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure, or
/// [`crate::DbError::Json`] if `paths` fails to encode.
pub async fn insert_result(pool: &DbPool, result: &TranscriptResult) -> Result<()> {
    let paths = serde_json::to_string(&result.paths)?;
    sqlx::query(
        "INSERT INTO results (id, job_id, file_id, segment_count, has_diarization, speaker_count, paths, \
         created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&result.id)
    .bind(&result.job_id)
    .bind(&result.file_id)
    .bind(i64::from(result.segment_count))
    .bind(result.speaker_count.is_some())
    .bind(result.speaker_count.map(i64::from))
    .bind(paths)
    .bind(result.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Lists every result produced for a job, ordered by creation (i.e. the
/// order files were processed in), per spec §6's results endpoint.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure, or
/// [`crate::DbError::Json`] if a `paths` column fails to decode.
pub async fn results_for_job(pool: &DbPool, job_id: &str) -> Result<Vec<TranscriptResult>> {
    let rows = sqlx::query(
        "SELECT id, job_id, file_id, segment_count, speaker_count, paths, created_at FROM results \
         WHERE job_id = ? ORDER BY created_at ASC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            row_to_result(ResultRow {
                id: row.get("id"),
                job_id: row.get("job_id"),
                file_id: row.get("file_id"),
                segment_count: row.get("segment_count"),
                speaker_count: row.get("speaker_count"),
                paths: row.get("paths"),
                created_at: row.get("created_at"),
            })
        })
        .collect()
}

/// Looks up the on-disk path for one `(job, file, format)` triple, the
/// operation backing `GET /api/v1/results/{job_id}/{format}` (spec §6).
/// Returns `None` if no result row or no artifact for that format exists.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure, or
/// [`crate::DbError::Json`] if a `paths` column fails to decode.
pub async fn result_path(pool: &DbPool, job_id: &str, file_id: &str, format: OutputFormat) -> Result<Option<String>> {
    let results = results_for_job(pool, job_id).await?;
    Ok(results.into_iter().find(|result| result.file_id == file_id).and_then(|result| result.paths.get(&format).cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    fn seed_job_and_file(job_id: &str, file_id: &str) -> voxjob_core::Job {
        voxjob_core::Job {
            id: job_id.to_string(),
            kind: voxjob_core::RecognizerKind::OriginWhisper,
            model_size: "base".to_string(),
            language: None,
            device: voxjob_core::Device::Cpu,
            parameters: voxjob_core::RecognitionParams::default(),
            diarization: voxjob_core::DiarizationConfig::default(),
            output_formats: vec![OutputFormat::Vtt],
            force_alignment: false,
            alignment_provider: None,
            postprocess: voxjob_core::PostprocessOptions::default(),
            file_ids: vec![file_id.to_string()],
            status: voxjob_core::JobStatus::Pending,
            progress: 0,
            current_file: None,
            total_files: 1,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    async fn seed(pool: &DbPool, job_id: &str, file_id: &str) {
        crate::files::insert_file(
            pool,
            &voxjob_core::UploadedFile {
                id: file_id.to_string(),
                original_filename: "a.wav".to_string(),
                storage_path: "/data/a.wav".to_string(),
                file_size: 10,
                mime_type: None,
                duration: None,
                uploaded_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        crate::jobs::insert_job(pool, &seed_job_and_file(job_id, file_id)).await.unwrap();
    }

    #[tokio::test]
    async fn insert_then_fetch_result_path() {
        let pool = connect("sqlite::memory:").await.unwrap();
        seed(&pool, "job-1", "file-1").await;

        let mut paths = BTreeMap::new();
        paths.insert(OutputFormat::Vtt, "/data/out/job-1/file-1.vtt".to_string());
        let result = TranscriptResult {
            id: "result-1".to_string(),
            job_id: "job-1".to_string(),
            file_id: "file-1".to_string(),
            segment_count: 3,
            speaker_count: None,
            paths,
            created_at: Utc::now(),
        };
        insert_result(&pool, &result).await.unwrap();

        let path = result_path(&pool, "job-1", "file-1", OutputFormat::Vtt).await.unwrap();
        assert_eq!(path, Some("/data/out/job-1/file-1.vtt".to_string()));

        let missing = result_path(&pool, "job-1", "file-1", OutputFormat::Srt).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn results_for_job_is_empty_before_any_result_is_written() {
        let pool = connect("sqlite::memory:").await.unwrap();
        seed(&pool, "job-2", "file-2").await;
        assert!(results_for_job(&pool, "job-2").await.unwrap().is_empty());
    }
}
