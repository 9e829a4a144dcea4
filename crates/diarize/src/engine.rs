// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Top-level entry point for spec §4.4: embed every segment, cluster, and
//! stamp a `speaker` label onto each one.

use std::path::Path;

use voxjob_core::{DiarizationConfig, Transcript};

use crate::cluster::{
    centroid_linkage, cut_for_speaker_bounds, l2_normalize_rows, reassign_small_clusters, relabel_by_first_appearance,
};
use crate::embedding::{EmbeddingExtractor, SegmentWindow};
use crate::error::{DiarizationError, Result};

/// Clustering parameters, configured rather than hard-coded per spec.md
/// §9's "document the clustering parameters... as configuration, not magic
/// numbers".
#[derive(Debug, Clone, Copy)]
pub struct ClusteringParams {
    pub threshold: f64,
    pub min_cluster_size: usize,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self { threshold: 0.8, min_cluster_size: 1 }
    }
}

/// Assigns a `speaker` label to every segment of `transcript`, per spec
/// §4.4's full algorithm. Mutates `transcript` in place.
///
/// # Errors
///
/// `AudioUnreadable`/`EmbeddingFailed` if the extractor fails; `Mismatch` if
/// (due to a defect) the produced label count does not equal the segment
/// count — this is never silently truncated.
pub async fn diarize(
    extractor: &dyn EmbeddingExtractor,
    audio_path: &Path,
    transcript: &mut Transcript,
    config: &DiarizationConfig,
    params: ClusteringParams,
) -> Result<()> {
    let n = transcript.segments.len();
    if n == 0 {
        return Ok(());
    }

    let windows: Vec<SegmentWindow> =
        transcript.segments.iter().map(|s| SegmentWindow { start: s.start, end: s.end }).collect();

    let mut embeddings = extractor.extract(audio_path, &windows).await?;
    l2_normalize_rows(&mut embeddings);

    let labels = if n == 1 {
        vec![0]
    } else {
        let merges = centroid_linkage(&embeddings);
        let mut labels = cut_for_speaker_bounds(
            n,
            &merges,
            params.threshold,
            params.min_cluster_size,
            config.min_speakers as usize,
            config.max_speakers as usize,
        );
        reassign_small_clusters(&embeddings, &mut labels, params.min_cluster_size);
        labels
    };

    let speaker_names = relabel_by_first_appearance(&labels);
    if speaker_names.len() != n {
        return Err(DiarizationError::Mismatch { expected: n, produced: speaker_names.len() });
    }

    for (segment, speaker) in transcript.segments.iter_mut().zip(speaker_names) {
        segment.speaker = Some(speaker);
    }

    Ok(())
}
