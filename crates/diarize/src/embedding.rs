// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The embedding step of spec §4.4. The real model (ResNet34-over-Kaldi-fbank
//! speaker embeddings) is out of scope — "the underlying ASR model code" per
//! spec §1 covers speaker embedding models too — so this module exposes a
//! trait seam and one deterministic stub implementation, mirroring the
//! recognizer crate's `Recognizer`/`StubRecognizer` split.

use std::path::Path;

use crate::error::{DiarizationError, Result};

/// One `[start, end]` segment window, in seconds, to embed.
#[derive(Debug, Clone, Copy)]
pub struct SegmentWindow {
    pub start: f64,
    pub end: f64,
}

/// Extracts one fixed-size embedding per segment window from an audio file.
///
/// Implementations must load audio at 16 kHz mono and slice
/// `[floor(start*sr), floor(end*sr))` per segment, per spec §4.4 step 1-2.
#[async_trait::async_trait]
pub trait EmbeddingExtractor: Send + Sync {
    async fn extract(&self, audio_path: &Path, windows: &[SegmentWindow]) -> Result<Vec<Vec<f64>>>;
}

/// A deterministic stand-in for the ResNet34 speaker embedding model.
///
/// Produces embeddings as a fixed-dimension hash of each window's rounded
/// start/end, so identical windows always embed identically and distinct
/// windows (almost always) embed distinctly — enough to drive clustering
/// logic in tests without a real model.
pub struct StubEmbeddingExtractor {
    dims: usize,
}

impl StubEmbeddingExtractor {
    #[must_use]
    pub const fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for StubEmbeddingExtractor {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait::async_trait]
impl EmbeddingExtractor for StubEmbeddingExtractor {
    async fn extract(&self, audio_path: &Path, windows: &[SegmentWindow]) -> Result<Vec<Vec<f64>>> {
        if !audio_path.exists() {
            return Err(DiarizationError::AudioUnreadable(audio_path.display().to_string()));
        }

        Ok(windows
            .iter()
            .map(|w| {
                let seed = (w.start * 1000.0).round() as i64;
                (0..self.dims)
                    .map(|d| {
                        let i = d as i64 + 1;
                        ((seed.wrapping_mul(i).wrapping_add(i * i)) % 997) as f64 / 997.0
                    })
                    .collect()
            })
            .collect())
    }
}
