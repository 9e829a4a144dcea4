// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_macros)]

use std::net::SocketAddr;

use axum::http::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::Duration;
use voxjob_server::config::Config;

/// Spins up a real server bound to an ephemeral port, backed by a temp-dir
/// sqlite database and storage root, following
/// `apps/skit/tests/http_sessions_test.rs`'s `create_app` + `TcpListener`
/// pattern.
async fn start_test_server() -> Option<(SocketAddr, TempDir, tokio::task::JoinHandle<()>)> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => return None,
        Err(e) => panic!("failed to bind test server listener: {e}"),
    };
    let addr = listener.local_addr().unwrap();

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let db_path = temp_dir.path().join("voxjob-test.sqlite3");
    let storage_root = temp_dir.path().join("storage");

    let mut config = Config::default();
    config.database.url = format!("sqlite://{}?mode=rwc", db_path.display());
    config.storage.root = storage_root.display().to_string();

    let (app, _state) = voxjob_server::server::create_app(config).await.expect("failed to build app");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    Some((addr, temp_dir, server_handle))
}

#[tokio::test]
async fn health_reports_enabled_providers() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let response = client.get(format!("http://{addr}/api/v1/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    let providers = body["providers"].as_array().unwrap();
    assert!(providers.iter().any(|p| p == "origin-whisper"));
    assert!(!providers.iter().any(|p| p == "fast-conformer"));
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"not audio".to_vec()).file_name("notes.txt"));

    let response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_a_files_field() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new().text("note", "hello");

    let response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_then_transcribe_reaches_a_terminal_status() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"RIFF....WAVEfmt ".to_vec()).file_name("clip.wav").mime_str("audio/wav").unwrap());

    let upload_response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    assert_eq!(upload_response.status(), StatusCode::CREATED);

    let upload_body: serde_json::Value = upload_response.json().await.unwrap();
    let file_id = upload_body["file_ids"][0].as_str().unwrap().to_string();

    let transcribe_body = serde_json::json!({
        "file_ids": [file_id],
        "model_type": "origin-whisper",
        "model_size": "base",
    });

    let transcribe_response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    assert_eq!(transcribe_response.status(), StatusCode::ACCEPTED);

    let transcribe_body: serde_json::Value = transcribe_response.json().await.unwrap();
    let job_id = transcribe_body["job_id"].as_str().unwrap().to_string();
    assert_eq!(transcribe_body["status"], "pending");

    let mut terminal_status = None;
    for _ in 0..50 {
        let status_response =
            client.get(format!("http://{addr}/api/v1/transcribe/jobs/{job_id}")).send().await.unwrap();
        assert_eq!(status_response.status(), StatusCode::OK);
        let status_body: serde_json::Value = status_response.json().await.unwrap();
        let status = status_body["status"].as_str().unwrap().to_string();
        if matches!(status.as_str(), "completed" | "failed" | "cancelled") {
            terminal_status = Some(status);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(terminal_status.is_some(), "job never reached a terminal status");
}

#[tokio::test]
async fn transcribe_accepts_alignment_and_postprocess_fields() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"fake".to_vec()).file_name("clip.wav").mime_str("audio/wav").unwrap());
    let upload_response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    let upload_body: serde_json::Value = upload_response.json().await.unwrap();
    let file_id = upload_body["file_ids"][0].as_str().unwrap().to_string();

    let transcribe_body = serde_json::json!({
        "file_ids": [file_id],
        "model_type": "origin-whisper",
        "model_size": "base",
        "force_alignment": true,
        "alignment_provider": "wav2vec2",
        "postprocess": {"pnc": true, "vad": true},
    });

    let response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn transcribe_rejects_disabled_backend() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"fake".to_vec()).file_name("clip.wav").mime_str("audio/wav").unwrap());
    let upload_response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    let upload_body: serde_json::Value = upload_response.json().await.unwrap();
    let file_id = upload_body["file_ids"][0].as_str().unwrap().to_string();

    let transcribe_body = serde_json::json!({
        "file_ids": [file_id],
        "model_type": "fast-conformer",
        "model_size": "large",
    });

    let response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transcribe_rejects_unknown_file_id() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let transcribe_body = serde_json::json!({
        "file_ids": ["does-not-exist"],
        "model_type": "origin-whisper",
        "model_size": "base",
    });

    let response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_status_for_unknown_job_returns_404() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let response =
        client.get(format!("http://{addr}/api/v1/transcribe/jobs/does-not-exist")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn results_summary_before_completion_returns_400() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"fake".to_vec()).file_name("clip.wav").mime_str("audio/wav").unwrap());
    let upload_response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    let upload_body: serde_json::Value = upload_response.json().await.unwrap();
    let file_id = upload_body["file_ids"][0].as_str().unwrap().to_string();

    let transcribe_body = serde_json::json!({
        "file_ids": [file_id],
        "model_type": "origin-whisper",
        "model_size": "base",
    });
    let transcribe_response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    let transcribe_body: serde_json::Value = transcribe_response.json().await.unwrap();
    let job_id = transcribe_body["job_id"].as_str().unwrap().to_string();

    let results_response =
        client.get(format!("http://{addr}/api/v1/results/{job_id}")).send().await.unwrap();
    assert_eq!(results_response.status(), StatusCode::BAD_REQUEST);

    let download_response =
        client.get(format!("http://{addr}/api/v1/results/{job_id}/vtt")).send().await.unwrap();
    assert_eq!(download_response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_distinguishes_not_completed_from_format_not_produced() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new()
        .part("files", reqwest::multipart::Part::bytes(b"RIFF....WAVEfmt ".to_vec()).file_name("clip.wav").mime_str("audio/wav").unwrap());
    let upload_response =
        client.post(format!("http://{addr}/api/v1/upload")).multipart(form).send().await.unwrap();
    let upload_body: serde_json::Value = upload_response.json().await.unwrap();
    let file_id = upload_body["file_ids"][0].as_str().unwrap().to_string();

    let transcribe_body = serde_json::json!({
        "file_ids": [file_id],
        "model_type": "origin-whisper",
        "model_size": "base",
        "output_formats": ["vtt"],
    });
    let transcribe_response = client
        .post(format!("http://{addr}/api/v1/transcribe"))
        .json(&transcribe_body)
        .send()
        .await
        .unwrap();
    let transcribe_body: serde_json::Value = transcribe_response.json().await.unwrap();
    let job_id = transcribe_body["job_id"].as_str().unwrap().to_string();

    // Only `vtt` was requested: before the job completes, any format download is a 400.
    let before_response =
        client.get(format!("http://{addr}/api/v1/results/{job_id}/vtt")).send().await.unwrap();
    assert_eq!(before_response.status(), StatusCode::BAD_REQUEST);

    let mut completed = false;
    for _ in 0..50 {
        let status_response =
            client.get(format!("http://{addr}/api/v1/transcribe/jobs/{job_id}")).send().await.unwrap();
        let status_body: serde_json::Value = status_response.json().await.unwrap();
        if status_body["status"] == "completed" {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(completed, "job never completed");

    // Requested format, after completion: 200.
    let vtt_response =
        client.get(format!("http://{addr}/api/v1/results/{job_id}/vtt")).send().await.unwrap();
    assert_eq!(vtt_response.status(), StatusCode::OK);

    // Valid format that was never requested, after completion: 404 per spec.md's
    // "returns 404 because only `vtt` was requested" scenario, not the 400 an
    // incomplete job would return.
    let srt_response =
        client.get(format!("http://{addr}/api/v1/results/{job_id}/srt")).send().await.unwrap();
    assert_eq!(srt_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn providers_lists_every_recognizer_kind() {
    let _ = tracing_subscriber::fmt::try_init();

    let Some((addr, _temp_dir, _server_handle)) = start_test_server().await else {
        eprintln!("skipping: local TCP bind not permitted");
        return;
    };

    let client = reqwest::Client::new();
    let response = client.get(format!("http://{addr}/api/v1/transcribe/providers")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["providers"].as_array().unwrap().len(), 11);
    assert!(body["model_sizes"].as_array().unwrap().contains(&serde_json::json!("base")));
}
