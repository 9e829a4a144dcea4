// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob DB — sqlite persistence for [`voxjob_core::UploadedFile`],
//! [`voxjob_core::Job`], and [`voxjob_core::TranscriptResult`] (spec §3/§6).

pub mod error;
pub mod files;
pub mod jobs;
pub mod pool;
pub mod results;

pub use error::DbError;
pub use pool::{connect, migrate, DbPool};
