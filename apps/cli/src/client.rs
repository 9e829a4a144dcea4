// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;
use std::str::FromStr;

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use voxjob_core::{Device, DiarizationConfig, RecognitionParams, RecognizerKind};

fn api_url(server_url: &str, path: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let base = server_url.trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err("server URL must be http(s)".into());
    }
    Ok(format!("{base}/api/v1{path}"))
}

async fn print_error_body(response: reqwest::Response) -> Box<dyn std::error::Error + Send + Sync> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("server returned error {status}: {body}").into()
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    database: String,
    providers: Vec<RecognizerKind>,
}

/// Fetch server health (GET /api/v1/health).
///
/// # Errors
///
/// Returns an error if the server URL is invalid, the request fails, or the response cannot be
/// parsed.
pub async fn health(server_url: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, "/health")?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }
    let health: HealthResponse = response.json().await?;
    println!("status: {}", health.status);
    println!("database: {}", health.database);
    println!("providers: {}", health.providers.iter().map(RecognizerKind::as_str).collect::<Vec<_>>().join(", "));
    Ok(())
}

#[derive(Deserialize)]
struct UploadResponse {
    file_ids: Vec<String>,
    uploaded_at: String,
}

/// Upload one or more audio/video files (POST /api/v1/upload, field "files").
///
/// # Errors
///
/// Returns an error if a file cannot be read, the server URL is invalid, the request fails, or
/// the server returns a non-success status.
pub async fn upload(
    paths: &[String],
    server_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, "/upload")?;

    let mut form = multipart::Form::new();
    for path in paths {
        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(format!("file not found: {path}").into());
        }
        let file_name = file_path.file_name().and_then(|n| n.to_str()).unwrap_or("upload").to_string();
        let bytes = tokio::fs::read(file_path).await?;
        debug!(file = %path, bytes = bytes.len(), "attaching file");
        form = form.part("files", multipart::Part::bytes(bytes).file_name(file_name));
    }

    info!(count = paths.len(), "uploading files");
    let response = client.post(url).multipart(form).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }

    let result: UploadResponse = response.json().await?;
    println!("uploaded_at: {}", result.uploaded_at);
    for id in &result.file_ids {
        println!("file_id: {id}");
    }
    Ok(())
}

/// Options accepted by [`transcribe`], mirroring `POST /api/v1/transcribe`'s request body.
pub struct TranscribeOptions {
    pub file_ids: Vec<String>,
    pub model_type: String,
    pub model_size: String,
    pub language: String,
    pub device: String,
    pub diarization: bool,
    pub min_speakers: u32,
    pub max_speakers: u32,
    pub output_formats: Vec<String>,
    pub force_alignment: bool,
    pub alignment_provider: Option<String>,
    pub pnc: bool,
    pub vad: bool,
}

#[derive(Serialize)]
struct PostprocessRequest {
    pnc: bool,
    vad: bool,
}

#[derive(Serialize)]
struct TranscribeRequest {
    file_ids: Vec<String>,
    model_type: RecognizerKind,
    model_size: String,
    language: String,
    device: Device,
    parameters: RecognitionParams,
    diarization: DiarizationConfig,
    output_formats: Vec<String>,
    force_alignment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    alignment_provider: Option<String>,
    postprocess: PostprocessRequest,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    job_id: String,
    status: String,
    message: String,
    files_count: u32,
}

/// Submit a transcription job (POST /api/v1/transcribe).
///
/// # Errors
///
/// Returns an error if `model_type` or `device` are not recognized, the server URL is invalid,
/// the request fails, or the server returns a non-success status.
pub async fn transcribe(
    options: &TranscribeOptions,
    server_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let model_type = RecognizerKind::from_str(&options.model_type)?;
    let device = match options.device.as_str() {
        "cpu" => Device::Cpu,
        "cuda" => Device::Cuda,
        other => return Err(format!("unknown device: {other}").into()),
    };

    let request = TranscribeRequest {
        file_ids: options.file_ids.clone(),
        model_type,
        model_size: options.model_size.clone(),
        language: options.language.clone(),
        device,
        parameters: RecognitionParams::default(),
        diarization: DiarizationConfig {
            enabled: options.diarization,
            min_speakers: options.min_speakers,
            max_speakers: options.max_speakers,
        },
        output_formats: options.output_formats.clone(),
        force_alignment: options.force_alignment,
        alignment_provider: options.alignment_provider.clone(),
        postprocess: PostprocessRequest { pnc: options.pnc, vad: options.vad },
    };

    let client = reqwest::Client::new();
    let url = api_url(server_url, "/transcribe")?;
    info!(files = options.file_ids.len(), model_type = %model_type, "submitting transcription job");
    let response = client.post(url).json(&request).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }

    let result: TranscribeResponse = response.json().await?;
    println!("job_id: {}", result.job_id);
    println!("status: {}", result.status);
    println!("files_count: {}", result.files_count);
    println!("{}", result.message);
    Ok(())
}

/// Fetch job status (GET /api/v1/transcribe/jobs/{job_id}).
///
/// # Errors
///
/// Returns an error if the server URL is invalid, the request fails, the job is unknown, or the
/// response cannot be parsed.
pub async fn job_status(
    job_id: &str,
    server_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, &format!("/transcribe/jobs/{job_id}"))?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// List enabled providers and supported model sizes (GET /api/v1/transcribe/providers).
///
/// # Errors
///
/// Returns an error if the server URL is invalid, the request fails, or the response cannot be
/// parsed.
pub async fn providers(server_url: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, "/transcribe/providers")?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Fetch the results summary for a completed job (GET /api/v1/results/{job_id}).
///
/// # Errors
///
/// Returns an error if the server URL is invalid, the job has not completed, the job is unknown,
/// or the response cannot be parsed.
pub async fn results_summary(
    job_id: &str,
    server_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, &format!("/results/{job_id}"))?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Download one produced result format to a local file
/// (GET /api/v1/results/{job_id}/{format}).
///
/// # Errors
///
/// Returns an error if the server URL is invalid, the format was not produced, the job has not
/// completed, or the download cannot be written to `output_path`.
pub async fn download_result(
    job_id: &str,
    format: &str,
    output_path: &str,
    server_url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let url = api_url(server_url, &format!("/results/{job_id}/{format}"))?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(print_error_body(response).await);
    }

    let bytes = response.bytes().await?;
    let written = bytes.len();
    tokio::fs::write(output_path, &bytes).await?;
    info!(output = %output_path, bytes = written, "downloaded result");
    println!("wrote {written} bytes to {output_path}");
    Ok(())
}
