// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The per-file transcription pipeline of spec §4.3: recognize → optional
//! diarize → write formats → persist a result row.

use std::path::{Path, PathBuf};
use std::time::Duration;

use voxjob_core::{Job, OutputFormat, Transcript, UploadedFile};
use voxjob_diarize::{diarize, ClusteringParams, EmbeddingExtractor};
use voxjob_formats::{formatters_for, write, WriteOptions};
use voxjob_recognizers::{align::needs_alignment, Aligner, RecognizerError};
use voxjob_registry::{RecognizerHandle, Registry};

use crate::error::{PipelineError, Result};
use crate::storage::derived_name;

/// Retry policy for `BackendTransient` failures, per spec §4.3: exponential
/// backoff with a fixed base, capped at `max_retries` additional attempts
/// (so `max_retries=2` allows up to 3 attempts total).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay: Duration::from_millis(200) }
    }
}

/// The outcome of transcribing and formatting one file, ready to persist as
/// a [`voxjob_core::TranscriptResult`].
#[derive(Debug)]
pub struct FileOutcome {
    pub segment_count: u32,
    pub speaker_count: Option<u32>,
    pub paths: std::collections::BTreeMap<OutputFormat, String>,
}

/// Calls `transcribe()` on `handle`, retrying on `BackendTransient` per
/// `policy`. Any other error (or exhausting retries) is returned as-is.
async fn transcribe_with_retry(
    recognizer: &RecognizerHandle,
    audio_path: &Path,
    language_hint: Option<&str>,
    params: &voxjob_core::RecognitionParams,
    policy: RetryPolicy,
) -> Result<Transcript> {
    let mut attempt = 0;
    loop {
        match recognizer.transcribe(audio_path, language_hint, params).await {
            Ok(transcript) => return Ok(transcript),
            Err(RecognizerError::BackendTransient(reason)) if attempt < policy.max_retries => {
                let delay = policy.base_delay * 2u32.pow(attempt);
                tracing::warn!(attempt, %reason, delay_ms = delay.as_millis(), "transient backend error, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(e) => return Err(PipelineError::Recognizer(e)),
        }
    }
}

/// Runs the full per-file pipeline of spec §4.3 for one `(Job, File)` pair,
/// writing every requested format and returning the summary that the job
/// lifecycle manager persists as a [`voxjob_core::TranscriptResult`] row.
///
/// # Errors
///
/// Returns [`PipelineError`] on recognizer failure (after exhausting
/// retries), diarization mismatch, or an I/O failure creating the output
/// directory. A single format-writer failure is logged and that format is
/// skipped — it never fails the file, per spec §4.3's failure-isolation
/// rule.
#[allow(clippy::too_many_arguments)]
pub async fn run_file(
    registry: &Registry,
    embedding_extractor: &dyn EmbeddingExtractor,
    aligner: &dyn Aligner,
    job: &Job,
    file: &UploadedFile,
    results_dir: &Path,
    write_options: &WriteOptions,
    clustering_params: ClusteringParams,
    retry_policy: RetryPolicy,
) -> Result<FileOutcome> {
    std::fs::create_dir_all(results_dir)?;

    let key = job.recognizer_key();
    let handle = registry.get(&key).await?;

    let audio_path = PathBuf::from(&file.storage_path);
    if !audio_path.exists() {
        return Err(PipelineError::AudioUnreadable(file.storage_path.clone()));
    }

    let params = job.parameters.normalized();
    let language_hint = job.language.as_deref().filter(|lang| *lang != "auto");
    let mut transcript = transcribe_with_retry(&handle, &audio_path, language_hint, &params, retry_policy).await?;
    drop(handle);

    if job.force_alignment && needs_alignment(&transcript) {
        if let Err(e) = aligner.align(&audio_path, &mut transcript).await {
            tracing::warn!(error = %e, "forced alignment failed, keeping recognizer timings");
        }
    }

    let mut speaker_count = None;
    if job.diarization.enabled && !transcript.segments.is_empty() {
        diarize(embedding_extractor, &audio_path, &mut transcript, &job.diarization, clustering_params).await?;
        let distinct: std::collections::HashSet<&str> =
            transcript.segments.iter().filter_map(|s| s.speaker.as_deref()).collect();
        speaker_count = Some(distinct.len() as u32);
    }

    let base_name = derived_name(&file.original_filename, job.kind);
    let naming_path = PathBuf::from(format!("{base_name}.audio"));

    let mut paths = std::collections::BTreeMap::new();
    for formatter in formatters_for(&job.output_formats) {
        match write(formatter.as_ref(), &transcript, write_options, results_dir, &naming_path) {
            Ok(path) => {
                paths.insert(formatter.format(), path.display().to_string());
            },
            Err(e) => {
                tracing::warn!(format = %formatter.format(), error = %e, "format writer failed, skipping");
            },
        }
    }

    Ok(FileOutcome { segment_count: transcript.segments.len() as u32, speaker_count, paths })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use voxjob_core::{Device, OutputFormat, RecognitionParams, RecognizerKind, Segment, Word};
    use voxjob_diarize::StubEmbeddingExtractor;
    use voxjob_recognizers::{Aligner, BackendsConfig, NoopAligner};

    use super::*;

    struct RecordingAligner {
        called: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Aligner for RecordingAligner {
        fn provider(&self) -> Option<&str> {
            Some("test-aligner")
        }

        async fn align(&self, _audio_path: &Path, transcript: &mut Transcript) -> Result<()> {
            self.called.store(true, Ordering::SeqCst);
            for segment in &mut transcript.segments {
                segment.words = Some(vec![Word { start: segment.start, end: segment.end, word: segment.text.clone() }]);
            }
            Ok(())
        }
    }

    fn sample_job(force_alignment: bool) -> Job {
        Job {
            id: "job-1".to_string(),
            kind: RecognizerKind::OriginWhisper,
            model_size: "base".to_string(),
            language: None,
            device: Device::Cpu,
            parameters: RecognitionParams::default(),
            diarization: voxjob_core::DiarizationConfig::default(),
            output_formats: vec![OutputFormat::Vtt],
            force_alignment,
            alignment_provider: None,
            postprocess: voxjob_core::PostprocessOptions::default(),
            file_ids: vec!["f1".to_string()],
            status: voxjob_core::JobStatus::Pending,
            progress: 0,
            current_file: None,
            total_files: 1,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn forced_alignment_runs_when_recognizer_produced_no_word_timings() {
        let audio = tempfile::NamedTempFile::new().unwrap();
        let results_dir = tempfile::tempdir().unwrap();
        let file = UploadedFile {
            id: "f1".to_string(),
            original_filename: "clip.wav".to_string(),
            storage_path: audio.path().display().to_string(),
            file_size: 10,
            mime_type: None,
            duration: None,
            uploaded_at: chrono::Utc::now(),
        };

        let registry = Registry::new(BackendsConfig::default());
        let embedding_extractor = StubEmbeddingExtractor::default();
        let aligner = RecordingAligner { called: AtomicBool::new(false) };
        let job = sample_job(true);

        run_file(
            &registry,
            &embedding_extractor,
            &aligner,
            &job,
            &file,
            results_dir.path(),
            &WriteOptions::default(),
            ClusteringParams::default(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert!(aligner.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn alignment_is_skipped_when_job_did_not_request_it() {
        let audio = tempfile::NamedTempFile::new().unwrap();
        let results_dir = tempfile::tempdir().unwrap();
        let file = UploadedFile {
            id: "f1".to_string(),
            original_filename: "clip.wav".to_string(),
            storage_path: audio.path().display().to_string(),
            file_size: 10,
            mime_type: None,
            duration: None,
            uploaded_at: chrono::Utc::now(),
        };

        let registry = Registry::new(BackendsConfig::default());
        let embedding_extractor = StubEmbeddingExtractor::default();
        let aligner = RecordingAligner { called: AtomicBool::new(false) };
        let job = sample_job(false);

        run_file(
            &registry,
            &embedding_extractor,
            &aligner,
            &job,
            &file,
            results_dir.path(),
            &WriteOptions::default(),
            ClusteringParams::default(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert!(!aligner.called.load(Ordering::SeqCst));
    }

    #[test]
    fn needs_alignment_helper_is_reexported() {
        let _ = NoopAligner;
        let transcript = Transcript { segments: vec![Segment::new(0.0, 1.0, "hi")] };
        assert!(voxjob_recognizers::align::needs_alignment(&transcript));
    }
}
