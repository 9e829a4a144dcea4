// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Filesystem layout of spec §6: `storage/uploads`, `storage/results`,
//! `storage/temp`, rooted at one configured directory.

use std::path::{Path, PathBuf};

use voxjob_core::RecognizerKind;

/// The three storage roots of spec §6, all living under one configured
/// base directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    #[must_use]
    pub fn results_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("results").join(job_id)
    }

    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    #[must_use]
    pub fn upload_path(&self, file_id: &str, extension: &str) -> PathBuf {
        self.uploads_dir().join(format!("{file_id}{extension}"))
    }

    /// Creates every storage root that does not already exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.root.join("results"))?;
        std::fs::create_dir_all(self.temp_dir())?;
        Ok(())
    }
}

/// The backend tag suffixed onto a derived output filename, per spec §6's
/// "Derived name" clause (e.g. `_whisper`, `_original_whisper`,
/// `_fastconformer`).
#[must_use]
pub const fn backend_tag(kind: RecognizerKind) -> &'static str {
    match kind {
        RecognizerKind::OriginWhisper => "_original_whisper",
        RecognizerKind::FasterWhisper => "_whisper",
        RecognizerKind::FastConformer => "_fastconformer",
        RecognizerKind::GoogleStt => "_google_stt",
        RecognizerKind::QwenAsr => "_qwen_asr",
        RecognizerKind::NemoCtcOffline => "_nemo_ctc",
        RecognizerKind::NemoRnntStreaming => "_nemo_rnnt",
        RecognizerKind::TritonCtc => "_triton_ctc",
        RecognizerKind::TritonRnnt => "_triton_rnnt",
        RecognizerKind::NvidiaRiva => "_nvidia_riva",
        RecognizerKind::HfAutoAsr => "_hf_auto_asr",
    }
}

/// Strips everything but alphanumerics and spaces from `original_filename`'s
/// stem and appends the backend tag, per spec §6's "Derived name" rule.
#[must_use]
pub fn derived_name(original_filename: &str, kind: RecognizerKind) -> String {
    let stem = Path::new(original_filename).file_stem().map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    let cleaned: String = stem.chars().filter(|c| c.is_alphanumeric() || *c == ' ').collect();
    let cleaned = if cleaned.trim().is_empty() { "output".to_string() } else { cleaned };
    format!("{cleaned}{}", backend_tag(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_name_strips_punctuation_and_appends_tag() {
        let name = derived_name("interview #3 (final).wav", RecognizerKind::FasterWhisper);
        assert_eq!(name, "interview 3 final_whisper");
    }

    #[test]
    fn derived_name_falls_back_to_output_for_empty_stem() {
        let name = derived_name("!!!.wav", RecognizerKind::FastConformer);
        assert_eq!(name, "output_fastconformer");
    }

    #[test]
    fn upload_path_joins_id_and_extension() {
        let layout = StorageLayout::new("/data");
        assert_eq!(layout.upload_path("abc", ".wav"), PathBuf::from("/data/uploads/abc.wav"));
    }
}
