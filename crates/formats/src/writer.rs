// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::path::{Path, PathBuf};

use voxjob_core::{OutputFormat, Transcript};

use crate::error::Result;
use crate::options::WriteOptions;

/// One subtitle/transcript writer per [`OutputFormat`], grounded on
/// `original_source/backend/app/core/processors/formatters.py`'s
/// `ResultWriter` hierarchy.
pub trait Formatter {
    fn format(&self) -> OutputFormat;

    /// Renders `transcript` to a UTF-8 string in this format.
    fn render(&self, transcript: &Transcript, options: &WriteOptions) -> Result<String>;
}

/// Derives the output path the same way `ResultWriter.__call__` does:
/// `output_dir/<audio_basename_without_ext>.<extension>`.
#[must_use]
pub fn derive_output_path(output_dir: &Path, audio_path: &Path, format: OutputFormat) -> PathBuf {
    let stem = audio_path.file_stem().map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    output_dir.join(format!("{stem}.{}", format.as_str()))
}

/// Renders and writes `transcript` via `formatter`, returning the path
/// written to. Per spec §4.3, a failure here is caught by the caller and
/// isolated to this one format — it never fails the whole job.
pub fn write(formatter: &dyn Formatter, transcript: &Transcript, options: &WriteOptions, output_dir: &Path, audio_path: &Path) -> Result<PathBuf> {
    let rendered = formatter.render(transcript, options)?;
    let path = derive_output_path(output_dir, audio_path, formatter.format());
    std::fs::write(&path, rendered).map_err(|e| crate::error::FormatError::Write { format: formatter.format(), reason: e.to_string() })?;
    Ok(path)
}

/// Returns one [`Formatter`] per requested format, in spec-stable order
/// (vtt, srt, tsv, txt, json) regardless of request order — mirrors
/// `get_writer("all", ...)`'s deterministic multi-writer fan-out.
#[must_use]
pub fn formatters_for(formats: &[OutputFormat]) -> Vec<Box<dyn Formatter>> {
    OutputFormat::ALL
        .iter()
        .filter(|f| formats.contains(f))
        .map(|f| -> Box<dyn Formatter> {
            match f {
                OutputFormat::Vtt => Box::new(crate::vtt::VttFormatter),
                OutputFormat::Srt => Box::new(crate::srt::SrtFormatter),
                OutputFormat::Tsv => Box::new(crate::tsv::TsvFormatter),
                OutputFormat::Txt => Box::new(crate::txt::TxtFormatter),
                OutputFormat::Json => Box::new(crate::json::JsonFormatter),
            }
        })
        .collect()
}
