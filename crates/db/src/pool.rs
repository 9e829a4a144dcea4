// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Connection pool setup and schema creation for the persistence layer of
//! spec §6, grounded on `original_source/backend/app/db/models.py`'s table
//! shapes (see `DESIGN.md` for the `job_files` join-table refinement).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::Result;

/// A pooled connection to the job service's sqlite database.
pub type DbPool = SqlitePool;

/// Opens (creating if necessary) the sqlite database at `database_url` and
/// runs schema creation. `database_url` is a `sqlite://path/to/file.db` URL
/// or `sqlite::memory:` for tests.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] if the connection cannot be established
/// or schema creation fails.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let options: SqliteConnectOptions = database_url.parse::<SqliteConnectOptions>()?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(8).connect_with(options).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Creates every table of spec §6 if it does not already exist. Idempotent,
/// safe to call on every process start.
///
/// # Errors
///
/// Returns [`crate::DbError::Sqlx`] if any statement fails.
pub async fn migrate(pool: &DbPool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS uploaded_files (
            id                TEXT PRIMARY KEY,
            original_filename TEXT NOT NULL,
            storage_path      TEXT NOT NULL,
            file_size         INTEGER NOT NULL,
            duration          REAL,
            mime_type         TEXT,
            uploaded_at       TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS jobs (
            id                  TEXT PRIMARY KEY,
            model_type          TEXT NOT NULL,
            model_size          TEXT NOT NULL,
            language            TEXT,
            device              TEXT NOT NULL,
            parameters          TEXT NOT NULL,
            diarization_config  TEXT NOT NULL,
            output_formats      TEXT NOT NULL,
            force_alignment     INTEGER NOT NULL,
            alignment_provider  TEXT,
            postprocess         TEXT NOT NULL DEFAULT '{}',
            status              TEXT NOT NULL,
            progress            INTEGER NOT NULL,
            current_file        TEXT,
            total_files         INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            started_at          TEXT,
            completed_at        TEXT,
            error_message       TEXT
        )
        ",
    )
    .execute(pool)
    .await?;

    // Join table rather than a nullable `job_id` on `uploaded_files`: one
    // uploaded file may be referenced by more than one job (DESIGN.md).
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS job_files (
            job_id   TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            file_id  TEXT NOT NULL REFERENCES uploaded_files(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            PRIMARY KEY (job_id, file_id)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS results (
            id               TEXT PRIMARY KEY,
            job_id           TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            file_id          TEXT NOT NULL REFERENCES uploaded_files(id) ON DELETE CASCADE,
            segment_count    INTEGER NOT NULL,
            has_diarization  INTEGER NOT NULL,
            speaker_count    INTEGER,
            paths            TEXT NOT NULL,
            created_at       TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_files_job ON job_files(job_id)").execute(pool).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_results_job ON results(job_id)").execute(pool).await?;

    Ok(())
}
