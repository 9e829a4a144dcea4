// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob Formats — the subtitle/transcript formatter of spec §4.5: a
//! canonical [`voxjob_core::Transcript`] in, one file per requested
//! [`voxjob_core::OutputFormat`] out.

pub mod error;
pub mod json;
pub mod options;
pub mod srt;
pub mod subtitles;
pub mod tsv;
pub mod txt;
pub mod vtt;
pub mod writer;

pub use error::FormatError;
pub use options::WriteOptions;
pub use writer::{derive_output_path, formatters_for, write, Formatter};
