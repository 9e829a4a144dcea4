// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Queries against `uploaded_files` (spec §3's [`UploadedFile`]).

use chrono::{DateTime, Utc};
use sqlx::Row;
use voxjob_core::UploadedFile;

use crate::error::Result;
use crate::pool::DbPool;

struct FileRow {
    id: String,
    original_filename: String,
    storage_path: String,
    file_size: i64,
    duration: Option<f64>,
    mime_type: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl From<FileRow> for UploadedFile {
    fn from(row: FileRow) -> Self {
        Self {
            id: row.id,
            original_filename: row.original_filename,
            storage_path: row.storage_path,
            file_size: row.file_size.max(0) as u64,
            mime_type: row.mime_type,
            duration: row.duration,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Records a freshly-stored upload. Called once per file, immediately after
/// the bytes land on disk (spec §4.2's upload handler).
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn insert_file(pool: &DbPool, file: &UploadedFile) -> Result<()> {
    #[allow(clippy::cast_possible_wrap)]
    let file_size = file.file_size as i64;
    sqlx::query(
        "INSERT INTO uploaded_files (id, original_filename, storage_path, file_size, duration, mime_type, uploaded_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&file.id)
    .bind(&file.original_filename)
    .bind(&file.storage_path)
    .bind(file_size)
    .bind(file.duration)
    .bind(&file.mime_type)
    .bind(file.uploaded_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Looks up one uploaded file by id.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn get_file(pool: &DbPool, file_id: &str) -> Result<Option<UploadedFile>> {
    let row = sqlx::query(
        "SELECT id, original_filename, storage_path, file_size, duration, mime_type, uploaded_at \
         FROM uploaded_files WHERE id = ?",
    )
    .bind(file_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        UploadedFile::from(FileRow {
            id: row.get("id"),
            original_filename: row.get("original_filename"),
            storage_path: row.get("storage_path"),
            file_size: row.get("file_size"),
            duration: row.get("duration"),
            mime_type: row.get("mime_type"),
            uploaded_at: row.get("uploaded_at"),
        })
    }))
}

/// Checks that every id in `file_ids` refers to a file that exists, per the
/// "references must resolve" precondition of spec §4.5's job creation.
/// Returns the subset of `file_ids` that were NOT found.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] on a database failure.
pub async fn missing_file_ids(pool: &DbPool, file_ids: &[String]) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for id in file_ids {
        if get_file(pool, id).await?.is_none() {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    fn sample_file() -> UploadedFile {
        UploadedFile {
            id: "file-1".to_string(),
            original_filename: "call.wav".to_string(),
            storage_path: "/data/uploads/file-1.wav".to_string(),
            file_size: 1024,
            mime_type: Some("audio/wav".to_string()),
            duration: Some(12.5),
            uploaded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let file = sample_file();
        insert_file(&pool, &file).await.unwrap();

        let fetched = get_file(&pool, &file.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, file.id);
        assert_eq!(fetched.file_size, file.file_size);
        assert_eq!(fetched.duration, file.duration);
    }

    #[tokio::test]
    async fn get_unknown_file_is_none() {
        let pool = connect("sqlite::memory:").await.unwrap();
        assert!(get_file(&pool, "does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_ids_reports_only_the_absent_ones() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let file = sample_file();
        insert_file(&pool, &file).await.unwrap();

        let missing = missing_file_ids(&pool, &[file.id.clone(), "ghost".to_string()]).await.unwrap();
        assert_eq!(missing, vec!["ghost".to_string()]);
    }
}
