// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The HTTP surface (C7) of spec §6: upload, job submission/status,
//! provider listing, result retrieval, and a health check — grounded on
//! the teacher's axum `Router`/`TraceLayer`/`CorsLayer` assembly and its
//! multipart streaming-upload handler.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use voxjob_core::{
    DiarizationConfig, Device, Job, JobStatus, OutputFormat, PostprocessOptions, RecognitionParams, RecognizerKind,
    UploadedFile,
};
use voxjob_diarize::StubEmbeddingExtractor;
use voxjob_pipeline::CreateJobRequest;

use crate::config::{Config, CorsConfig};
use crate::error::ApiError;
use crate::state::AppState;

/// Builds the axum `Router` plus the state it was constructed from — the
/// shape the integration tests bind against, following
/// `apps/skit/tests/http_sessions_test.rs`'s `create_app` usage.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the storage roots
/// cannot be created.
pub async fn create_app(config: Config) -> anyhow::Result<(Router, AppState)> {
    let db = voxjob_db::connect(&config.database.url).await?;
    let embedding_extractor: Arc<dyn voxjob_diarize::EmbeddingExtractor> = Arc::new(StubEmbeddingExtractor::default());
    let state = AppState::new(config, db, embedding_extractor);
    state.runtime.storage.ensure_dirs()?;

    let app = build_router(state.clone());
    Ok((app, state))
}

fn build_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;
    let cors = create_cors_layer(&state.config.server.cors);

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/upload", post(upload_handler).layer(DefaultBodyLimit::max(max_body_size)))
        .route("/api/v1/transcribe", post(transcribe_handler))
        .route("/api/v1/transcribe/jobs/{job_id}", get(job_status_handler))
        .route("/api/v1/transcribe/providers", get(providers_handler))
        .route("/api/v1/results/{job_id}", get(results_summary_handler))
        .route("/api/v1/results/{job_id}/{format}", get(result_download_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins = config.allowed_origins.clone();
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let Ok(origin) = origin.to_str() else { return false };
            origins.iter().any(|pattern| origin_matches(pattern, origin))
        }))
}

fn origin_matches(pattern: &str, origin: &str) -> bool {
    pattern.strip_suffix('*').map_or_else(|| pattern == origin, |prefix| origin.starts_with(prefix))
}

/// Starts listening on `config.server.address` and serves the app until a
/// ctrl-c or SIGTERM is received.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server exits
/// with an I/O error.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let (app, state) = create_app(config.clone()).await?;
    let addr = state.config.server.address.clone();
    info!(address = %addr, "starting voxjob server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else { return };
        sig.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

// --- GET /api/v1/health ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    providers: Vec<RecognizerKind>,
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database = if sqlx::query("SELECT 1").execute(state.db()).await.is_ok() { "ok" } else { "unreachable" };
    let providers: Vec<RecognizerKind> = RecognizerKind::ALL.into_iter().filter(|k| state.config.backends.enabled.contains(k)).collect();
    Json(HealthResponse { status: "ok", database, providers })
}

// --- POST /api/v1/upload ---

#[derive(Serialize)]
struct UploadResponse {
    file_ids: Vec<String>,
    uploaded_at: DateTime<Utc>,
}

fn extension_of(filename: &str) -> String {
    Path::new(filename).extension().map(|e| format!(".{}", e.to_string_lossy().to_lowercase())).unwrap_or_default()
}

async fn cleanup_partial_uploads(paths: &[PathBuf]) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}

async fn stream_field_to_file(
    field: &mut axum::extract::multipart::Field<'_>,
    dest: &Path,
    max_body_size: usize,
) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut total: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        total = total.saturating_add(chunk.len() as u64);
        if total > max_body_size as u64 {
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
            return Err(ApiError::BadRequest(format!("uploaded file exceeds the {max_body_size}-byte limit")));
        }
        file.write_all(&chunk).await?;
    }
    Ok(total)
}

/// Streams each `files` field to `storage/uploads/<file_id><ext>`, per
/// spec §6. Rejects an unknown extension or an incompatible MIME prefix
/// before anything is written; a write/persistence failure rolls back
/// every file already written in this request (spec §6's "500 with
/// rollback on write failure").
async fn upload_handler(State(state): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let max_files = state.config.upload.max_files_per_request;
    let max_body_size = state.config.server.max_body_size;

    let mut file_ids = Vec::new();
    let mut written_paths: Vec<PathBuf> = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }

        if file_ids.len() >= max_files {
            cleanup_partial_uploads(&written_paths).await;
            return Err(ApiError::BadRequest(format!("at most {max_files} files are accepted per request")));
        }

        let original_filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("every uploaded file must include a filename".to_string()))?;

        let extension = extension_of(&original_filename);
        if !state.config.upload.allowed_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
            cleanup_partial_uploads(&written_paths).await;
            return Err(ApiError::BadRequest(format!("unsupported file extension: {extension}")));
        }

        let mime_type = field.content_type().map(str::to_string);
        if let Some(mime) = &mime_type {
            if !(mime.starts_with("audio/") || mime.starts_with("video/")) {
                cleanup_partial_uploads(&written_paths).await;
                return Err(ApiError::BadRequest(format!("unsupported content type: {mime}")));
            }
        }

        let file_id = Uuid::new_v4().to_string();
        let dest = state.runtime.storage.upload_path(&file_id, &extension);

        let file_size = match stream_field_to_file(&mut field, &dest, max_body_size).await {
            Ok(size) => size,
            Err(e) => {
                cleanup_partial_uploads(&written_paths).await;
                return Err(e);
            },
        };
        written_paths.push(dest.clone());

        let uploaded_file = UploadedFile {
            id: file_id.clone(),
            original_filename,
            storage_path: dest.display().to_string(),
            file_size,
            mime_type,
            duration: None,
            uploaded_at: Utc::now(),
        };
        if let Err(e) = voxjob_db::files::insert_file(state.db(), &uploaded_file).await {
            warn!(error = %e, "upload persistence failed, rolling back written files");
            cleanup_partial_uploads(&written_paths).await;
            return Err(e.into());
        }

        file_ids.push(file_id);
    }

    if file_ids.is_empty() {
        return Err(ApiError::BadRequest("request carried no 'files' field".to_string()));
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { file_ids, uploaded_at: Utc::now() })))
}

// --- POST /api/v1/transcribe ---

#[derive(Deserialize)]
struct TranscribeRequest {
    file_ids: Vec<String>,
    model_type: RecognizerKind,
    model_size: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_device")]
    device: Device,
    #[serde(default)]
    parameters: RecognitionParams,
    #[serde(default)]
    diarization: DiarizationConfig,
    #[serde(default = "default_output_formats")]
    output_formats: Vec<String>,
    #[serde(default)]
    force_alignment: bool,
    #[serde(default)]
    alignment_provider: Option<String>,
    #[serde(default)]
    postprocess: PostprocessOptions,
}

fn default_language() -> String {
    "auto".to_string()
}

const fn default_device() -> Device {
    Device::Cpu
}

fn default_output_formats() -> Vec<String> {
    vec!["all".to_string()]
}

fn parse_output_formats(requested: &[String]) -> Result<Vec<OutputFormat>, ApiError> {
    if requested.iter().any(|f| f.eq_ignore_ascii_case("all")) {
        return Ok(OutputFormat::ALL.to_vec());
    }
    requested.iter().map(|f| OutputFormat::from_str(f).map_err(ApiError::BadRequest)).collect()
}

#[derive(Serialize)]
struct TranscribeResponse {
    job_id: String,
    status: JobStatus,
    message: &'static str,
    files_count: u32,
}

/// Validates, persists, and enqueues a job, per spec §4.6's `create_job` +
/// `spawn_run_job`. Returns immediately once the job is `pending` — the API
/// never blocks on job execution (spec §9's "Background work" note).
async fn transcribe_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.config.backends.enabled.contains(&request.model_type) {
        return Err(voxjob_core::VoxJobError::BackendDisabled(request.model_type.to_string()).into());
    }

    let output_formats = parse_output_formats(&request.output_formats)?;
    let diarization = clamp_diarization(request.diarization);

    let create_request = CreateJobRequest {
        kind: request.model_type,
        model_size: request.model_size,
        language: Some(request.language),
        device: request.device,
        parameters: request.parameters,
        diarization,
        output_formats,
        force_alignment: request.force_alignment,
        alignment_provider: request.alignment_provider,
        postprocess: request.postprocess,
        file_ids: request.file_ids,
    };

    let job = voxjob_pipeline::create_job(state.db(), create_request).await?;
    voxjob_pipeline::spawn_run_job(state.runtime.clone(), job.id.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(TranscribeResponse { job_id: job.id, status: job.status, message: "job accepted", files_count: job.total_files }),
    ))
}

/// Clamps `min_speakers`/`max_speakers` to `1..=20`, per spec §4.4.
fn clamp_diarization(mut config: DiarizationConfig) -> DiarizationConfig {
    config.min_speakers = config.min_speakers.clamp(1, 20);
    config.max_speakers = config.max_speakers.clamp(config.min_speakers, 20);
    config
}

// --- GET /api/v1/transcribe/jobs/{job_id} ---

#[derive(Serialize)]
struct JobStatusResponse {
    job_id: String,
    status: JobStatus,
    progress: u8,
    current_file: Option<String>,
    total_files: u32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            current_file: job.current_file,
            total_files: job.total_files,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            error: job.error_message,
        }
    }
}

async fn job_status_handler(
    State(state): State<AppState>,
    AxumPath(job_id): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = voxjob_pipeline::get_job(state.db(), &job_id).await?;
    Ok(Json(JobStatusResponse::from(job)))
}

// --- GET /api/v1/transcribe/providers ---

/// Whisper-family sizes shared across recognizer kinds; this service does
/// not load model weights itself, so size support is advertised rather
/// than probed.
const KNOWN_MODEL_SIZES: [&str; 6] = ["tiny", "base", "small", "medium", "large-v2", "large-v3"];

#[derive(Serialize)]
struct ProviderInfo {
    kind: RecognizerKind,
    enabled: bool,
    subprocess: bool,
}

#[derive(Serialize)]
struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
    model_sizes: &'static [&'static str],
    languages: Vec<&'static str>,
}

async fn providers_handler(State(state): State<AppState>) -> impl IntoResponse {
    let providers = RecognizerKind::ALL
        .into_iter()
        .map(|kind| ProviderInfo { kind, enabled: state.config.backends.enabled.contains(&kind), subprocess: kind.is_subprocess() })
        .collect();

    Json(ProvidersResponse { providers, model_sizes: &KNOWN_MODEL_SIZES, languages: vec!["auto"] })
}

// --- GET /api/v1/results/{job_id} ---

#[derive(Serialize)]
struct ResultSummaryEntry {
    file_id: String,
    segment_count: u32,
    speaker_count: Option<u32>,
    formats: Vec<OutputFormat>,
}

#[derive(Serialize)]
struct ResultsSummaryResponse {
    job_id: String,
    results: Vec<ResultSummaryEntry>,
}

async fn results_summary_handler(
    State(state): State<AppState>,
    AxumPath(job_id): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let results = voxjob_pipeline::get_results_summary(state.db(), &job_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("job {job_id} has not completed")))?;

    let results = results
        .into_iter()
        .map(|r| ResultSummaryEntry {
            file_id: r.file_id,
            segment_count: r.segment_count,
            speaker_count: r.speaker_count,
            formats: r.paths.keys().copied().collect(),
        })
        .collect();

    Ok(Json(ResultsSummaryResponse { job_id, results }))
}

// --- GET /api/v1/results/{job_id}/{format} ---

async fn result_download_handler(
    State(state): State<AppState>,
    AxumPath((job_id, format)): AxumPath<(String, String)>,
) -> Result<Response, ApiError> {
    let format = OutputFormat::from_str(&format).map_err(ApiError::BadRequest)?;

    let path = match voxjob_pipeline::get_result_path(state.db(), &job_id, format).await? {
        voxjob_pipeline::ResultLookup::NotCompleted => {
            return Err(ApiError::BadRequest(format!("job {job_id} has not completed")))
        },
        voxjob_pipeline::ResultLookup::NotProduced => {
            return Err(ApiError::NotFound(format!("{format} was not produced for job {job_id}")))
        },
        voxjob_pipeline::ResultLookup::Found(path) => path,
    };

    let body =
        tokio::fs::read(&path).await.map_err(|_| ApiError::NotFound(format!("{format} was not produced for job {job_id}")))?;

    Ok(([("content-type", format.mime_type())], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_wildcard_matches_any_port() {
        assert!(origin_matches("http://localhost:*", "http://localhost:5173"));
        assert!(!origin_matches("http://localhost:*", "http://evil.example"));
    }

    #[test]
    fn origin_exact_match() {
        assert!(origin_matches("http://localhost", "http://localhost"));
        assert!(!origin_matches("http://localhost", "http://localhost:3000"));
    }

    #[test]
    fn parse_output_formats_expands_all() {
        let formats = parse_output_formats(&["all".to_string()]).unwrap();
        assert_eq!(formats.len(), OutputFormat::ALL.len());
    }

    #[test]
    fn parse_output_formats_rejects_unknown() {
        assert!(parse_output_formats(&["xml".to_string()]).is_err());
    }

    #[test]
    fn clamp_diarization_bounds_speaker_counts() {
        let config = DiarizationConfig { enabled: true, min_speakers: 0, max_speakers: 50 };
        let clamped = clamp_diarization(config);
        assert_eq!(clamped.min_speakers, 1);
        assert_eq!(clamped.max_speakers, 20);
    }
}
