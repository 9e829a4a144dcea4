// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob Diarize — the speaker diarization engine of spec §4.4: embed each
//! segment, cluster the embeddings with bounded cluster counts, and
//! relabel segments in place.

pub mod cluster;
pub mod embedding;
pub mod engine;
pub mod error;

pub use embedding::{EmbeddingExtractor, SegmentWindow, StubEmbeddingExtractor};
pub use engine::{diarize, ClusteringParams};
pub use error::DiarizationError;
