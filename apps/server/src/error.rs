// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The HTTP-boundary error type of spec §7: maps the taxonomy composed
//! across crate boundaries onto status codes, following the teacher's
//! local `AppError`/`PluginHttpError` `IntoResponse` pattern.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use voxjob_core::VoxJobError;

#[derive(Debug)]
pub enum ApiError {
    Core(VoxJobError),
    BadRequest(String),
    NotFound(String),
    Multipart(MultipartError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Core(e) => core_error_status(&e),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Multipart(err) => (StatusCode::BAD_REQUEST, format!("invalid multipart payload: {err}")),
        };
        if status.is_server_error() {
            tracing::error!(%message, %status, "request failed");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Maps the structured taxonomy onto status codes per spec §7's table.
fn core_error_status(e: &VoxJobError) -> (StatusCode, String) {
    let message = e.to_string();
    let status = match e {
        VoxJobError::Validation(_) => StatusCode::BAD_REQUEST,
        VoxJobError::UnknownJob(_) => StatusCode::NOT_FOUND,
        VoxJobError::UnknownFile(_) => StatusCode::BAD_REQUEST,
        VoxJobError::BackendDisabled(_) => StatusCode::BAD_REQUEST,
        VoxJobError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        VoxJobError::ModelLoadError { .. }
        | VoxJobError::Storage(_)
        | VoxJobError::Io(_)
        | VoxJobError::BackendPermanent(_)
        | VoxJobError::DiarizationMismatch { .. }
        | VoxJobError::FormatWriteError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        VoxJobError::BackendTransient { .. } => StatusCode::SERVICE_UNAVAILABLE,
        VoxJobError::AudioUnreadable(_) => StatusCode::BAD_REQUEST,
        VoxJobError::TimeoutExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, message)
}

impl From<VoxJobError> for ApiError {
    fn from(e: VoxJobError) -> Self {
        Self::Core(e)
    }
}

impl From<voxjob_pipeline::JobError> for ApiError {
    fn from(e: voxjob_pipeline::JobError) -> Self {
        Self::Core(e.into())
    }
}

impl From<voxjob_db::DbError> for ApiError {
    fn from(e: voxjob_db::DbError) -> Self {
        Self::Core(e.into())
    }
}

impl From<voxjob_registry::RegistryError> for ApiError {
    fn from(e: voxjob_registry::RegistryError) -> Self {
        Self::Core(e.into())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Core(VoxJobError::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_maps_to_404() {
        let (status, _) = core_error_status(&VoxJobError::UnknownJob("abc".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_400() {
        let (status, _) = core_error_status(&VoxJobError::Validation("bad".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_unavailable_maps_to_503() {
        let (status, _) = core_error_status(&VoxJobError::BackendUnavailable("x".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
