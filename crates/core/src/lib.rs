// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob Core — data model and error taxonomy shared across the transcription
//! job service.
//!
//! ## Modules
//!
//! - [`model`]: `Job`, `UploadedFile`, `Result` (renamed [`model::TranscriptResult`]
//!   to avoid shadowing `std::result::Result`), `Segment`, `Word`, `RecognizerKey`.
//! - [`error`]: the structured error taxonomy of the job service, one variant
//!   family per failure domain.
//! - [`time`]: timestamp formatting/parsing shared by the subtitle formatter
//!   and the HTTP surface.

pub mod error;
pub mod model;
pub mod time;

pub use error::VoxJobError;
pub use model::{
    ComputeType, DiarizationConfig, Device, Job, JobStatus, OutputFormat, PostprocessOptions, RecognitionParams,
    RecognizerKey, RecognizerKind, Segment, Transcript, TranscriptResult, UploadedFile, Word,
};
