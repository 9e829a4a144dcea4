// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The forced-alignment collaborator of spec §4.3 step 2 and §9's "Open
//! Question — forced alignment": when a job requests `force_alignment` and
//! the recognizer's transcript carries no word timings, the pipeline calls
//! out to an aligner to fill them in. The real aligner (a wav2vec2-CTC-style
//! forced aligner) is out of scope per spec §1, so this module exposes the
//! trait seam and a [`NoopAligner`] that leaves the transcript untouched —
//! "stubbable; no-op if unavailable" per spec §4.3, mirroring the
//! `EmbeddingExtractor`/`StubEmbeddingExtractor` split in `voxjob-diarize`.

use std::path::Path;

use voxjob_core::Transcript;

use crate::error::Result;

/// Fills in word-level timings for a transcript that otherwise has none.
#[async_trait::async_trait]
pub trait Aligner: Send + Sync {
    /// Which provider name this aligner answers to (matched against a job's
    /// `alignment_provider`, case-insensitively; `None` accepts any).
    fn provider(&self) -> Option<&str>;

    /// Aligns `transcript` against `audio_path` in place, attaching a
    /// `words` list to every segment. Implementations should leave
    /// `transcript` untouched on failure rather than partially filling it.
    async fn align(&self, audio_path: &Path, transcript: &mut Transcript) -> Result<()>;
}

/// The default aligner: does nothing. Selected whenever no aligner provider
/// is configured, matching spec §4.3's "no-op if unavailable" clause — a
/// job with `force_alignment: true` and no configured aligner simply keeps
/// whatever (or no) word timings the recognizer produced.
#[derive(Debug, Default)]
pub struct NoopAligner;

#[async_trait::async_trait]
impl Aligner for NoopAligner {
    fn provider(&self) -> Option<&str> {
        None
    }

    async fn align(&self, _audio_path: &Path, _transcript: &mut Transcript) -> Result<()> {
        Ok(())
    }
}

/// True when `transcript` needs alignment: at least one segment has no
/// word timings. Forced alignment only runs for segments actually missing
/// timings, per spec §4.3 ("the recognizer has no word timings").
#[must_use]
pub fn needs_alignment(transcript: &Transcript) -> bool {
    transcript.segments.iter().any(|s| s.words.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::Segment;

    #[tokio::test]
    async fn noop_aligner_leaves_transcript_untouched() {
        let mut transcript = Transcript { segments: vec![Segment::new(0.0, 1.0, "hi")] };
        NoopAligner.align(Path::new("/dev/null"), &mut transcript).await.unwrap();
        assert!(transcript.segments[0].words.is_none());
    }

    #[test]
    fn needs_alignment_true_when_any_segment_lacks_words() {
        let transcript = Transcript { segments: vec![Segment::new(0.0, 1.0, "hi")] };
        assert!(needs_alignment(&transcript));
    }

    #[test]
    fn needs_alignment_false_when_every_segment_has_words() {
        let mut segment = Segment::new(0.0, 1.0, "hi");
        segment.words = Some(vec![]);
        let transcript = Transcript { segments: vec![segment] };
        assert!(!needs_alignment(&transcript));
    }
}
