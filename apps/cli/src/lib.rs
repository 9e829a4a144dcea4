// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

// Allow println/eprintln in CLI client - these are for direct user output, not logging
#![allow(clippy::disallowed_macros)]

pub mod client;

pub use client::{
    download_result, health, job_status, providers, results_summary, transcribe, upload,
    TranscribeOptions,
};
