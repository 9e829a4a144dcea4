// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The data model of §3: `UploadedFile`, `Job`, `TranscriptResult`, `Segment`,
//! `Word`, and `RecognizerKey`. These types are persistence-agnostic — the
//! `voxjob-db` crate maps them to and from SQLite rows; this crate only
//! fixes their shape and invariants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The recognizer backends enumerated in spec §4.1. Every variant is a wire
/// value (`kebab-case` over the HTTP API and the sqlite `model_type` column);
/// unknown strings are rejected at the HTTP boundary with `ValidationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RecognizerKind {
    OriginWhisper,
    FasterWhisper,
    FastConformer,
    GoogleStt,
    QwenAsr,
    NemoCtcOffline,
    NemoRnntStreaming,
    TritonCtc,
    TritonRnnt,
    NvidiaRiva,
    HfAutoAsr,
}

impl RecognizerKind {
    /// All variants, used to validate configuration and to populate
    /// `GET /providers`.
    pub const ALL: [Self; 11] = [
        Self::OriginWhisper,
        Self::FasterWhisper,
        Self::FastConformer,
        Self::GoogleStt,
        Self::QwenAsr,
        Self::NemoCtcOffline,
        Self::NemoRnntStreaming,
        Self::TritonCtc,
        Self::TritonRnnt,
        Self::NvidiaRiva,
        Self::HfAutoAsr,
    ];

    /// Whether this kind is invoked via an external subprocess container
    /// rather than an in-process model load (only `fast_conformer`, per
    /// spec §4.1 and §6's "out-of-band collaborators").
    #[must_use]
    pub const fn is_subprocess(self) -> bool {
        matches!(self, Self::FastConformer)
    }

    /// Whether this kind accepts `compute_type` (faster_whisper only, per
    /// the `params` table in spec §4.1).
    #[must_use]
    pub const fn accepts_compute_type(self) -> bool {
        matches!(self, Self::FasterWhisper)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OriginWhisper => "origin_whisper",
            Self::FasterWhisper => "faster_whisper",
            Self::FastConformer => "fast_conformer",
            Self::GoogleStt => "google_stt",
            Self::QwenAsr => "qwen_asr",
            Self::NemoCtcOffline => "nemo_ctc_offline",
            Self::NemoRnntStreaming => "nemo_rnnt_streaming",
            Self::TritonCtc => "triton_ctc",
            Self::TritonRnnt => "triton_rnnt",
            Self::NvidiaRiva => "nvidia_riva",
            Self::HfAutoAsr => "hf_auto_asr",
        }
    }
}

impl fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecognizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown recognizer kind: {s}"))
    }
}

/// Device preference for a job, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
        })
    }
}

/// `compute_type` as accepted by `faster_whisper`; ignored by every other
/// kind per the `params` table of spec §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComputeType {
    Int8,
    Float32,
    Float16,
}

/// The cache key of spec §4.2/§3: `(kind, size, device, compute_type?)`.
/// `compute_type` is only present when `kind.accepts_compute_type()`, so two
/// requests that differ only in an ignored `compute_type` hash to the same
/// key — this is load-bearing for the "at-most-one load per key" contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognizerKey {
    pub kind: RecognizerKind,
    pub size: String,
    pub device: Device,
    pub compute_type: Option<ComputeType>,
}

impl RecognizerKey {
    #[must_use]
    pub fn new(kind: RecognizerKind, size: impl Into<String>, device: Device, compute_type: Option<ComputeType>) -> Self {
        let compute_type = if kind.accepts_compute_type() { compute_type } else { None };
        Self { kind, size: size.into(), device, compute_type }
    }
}

impl fmt::Display for RecognizerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.compute_type {
            Some(ct) => write!(f, "{}:{}:{}:{ct:?}", self.kind, self.size, self.device),
            None => write!(f, "{}:{}:{}", self.kind, self.size, self.device),
        }
    }
}

/// Recognition parameters of the `params` table in spec §4.1. Sentinel
/// values (`0`, empty string) mean "engine default" and are normalized to
/// `None`/absent by [`RecognitionParams::normalized`] before dispatch —
/// the Open Question resolution recorded in `DESIGN.md`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct RecognitionParams {
    pub beam_size: Option<u32>,
    pub patience: Option<f64>,
    pub length_penalty: Option<f64>,
    pub temperature: Option<f64>,
    pub compression_ratio_threshold: Option<f64>,
    pub logprob_threshold: Option<f64>,
    pub no_speech_threshold: Option<f64>,
    pub condition_on_previous_text: Option<bool>,
    pub initial_prompt: Option<String>,
    pub vad_onset: Option<f64>,
    pub vad_offset: Option<f64>,
    pub remove_punctuation_from_words: Option<bool>,
    pub remove_empty_words: Option<bool>,
    pub compute_type: Option<ComputeType>,
}

impl RecognitionParams {
    /// Collapses sentinel zeros and empty strings to "engine default"
    /// (`None`), per spec §4.1 and the Open Question resolution in
    /// `DESIGN.md`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            beam_size: self.beam_size.filter(|v| *v != 0),
            patience: self.patience.filter(|v| *v != 0.0),
            length_penalty: self.length_penalty.filter(|v| *v != 0.0),
            temperature: self.temperature,
            compression_ratio_threshold: self.compression_ratio_threshold,
            logprob_threshold: self.logprob_threshold,
            no_speech_threshold: self.no_speech_threshold,
            condition_on_previous_text: self.condition_on_previous_text,
            initial_prompt: self.initial_prompt.clone().filter(|s| !s.is_empty()),
            vad_onset: self.vad_onset,
            vad_offset: self.vad_offset,
            remove_punctuation_from_words: self.remove_punctuation_from_words,
            remove_empty_words: self.remove_empty_words,
            compute_type: self.compute_type,
        }
    }
}

/// Post-processing toggles from spec §6's `POST /transcribe` body. Neither
/// flag is interpreted by this service directly — `pnc` ("punctuation &
/// capitalization") and `vad` (voice-activity-bounded recognition windows)
/// are recognizer-side concerns (§1's "the underlying ASR model code...is
/// an external collaborator") — they are threaded through to the
/// recognizer adapter as part of the job record so a backend that supports
/// them can read them off the job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct PostprocessOptions {
    pub pnc: bool,
    pub vad: bool,
}

/// Diarization request options of spec §3/§4.4. `min_speakers` and
/// `max_speakers` are clamped to `1..=20` at validation time (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DiarizationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "DiarizationConfig::default_min_speakers")]
    pub min_speakers: u32,
    #[serde(default = "DiarizationConfig::default_max_speakers")]
    pub max_speakers: u32,
}

impl DiarizationConfig {
    const fn default_min_speakers() -> u32 {
        1
    }

    const fn default_max_speakers() -> u32 {
        20
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self { enabled: false, min_speakers: Self::default_min_speakers(), max_speakers: Self::default_max_speakers() }
    }
}

/// One requested/produced subtitle or transcript output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Vtt,
    Srt,
    Tsv,
    Txt,
    Json,
}

impl OutputFormat {
    /// Every concrete format produced when a job requests `"all"`.
    pub const ALL: [Self; 5] = [Self::Vtt, Self::Srt, Self::Tsv, Self::Txt, Self::Json];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vtt => "vtt",
            Self::Srt => "srt",
            Self::Tsv => "tsv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }

    /// MIME type for the HTTP download endpoint, per spec §6.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Vtt => "text/vtt",
            Self::Srt => "application/x-subrip",
            Self::Tsv => "text/tab-separated-values",
            Self::Txt => "text/plain",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|f| f.as_str() == s).ok_or_else(|| format!("unknown output format: {s}"))
    }
}

/// A word-level timing entry within a [`Segment`], per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub word: String,
}

/// The canonical in-memory transcript element of spec §3. `speaker` is
/// filled in by the diarization engine (§4.4); `words` is populated only by
/// recognizers/aligners that produce word-level timing.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

impl Segment {
    #[must_use]
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into(), speaker: None, words: None }
    }
}

/// `{segments: [Segment]}` in the canonical shape of spec §3/glossary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

/// An on-disk, immutable, uploaded input file (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub original_filename: String,
    pub storage_path: String,
    pub file_size: u64,
    pub mime_type: Option<String>,
    pub duration: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

/// The job state machine of spec §4.6: `pending → processing →
/// {completed | failed | cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// True once a job has left `pending` — used to decide whether
    /// `started_at` must be set (spec §8's state-monotonicity property).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A transcription job, per spec §3. Owns its [`TranscriptResult`]s by id;
/// references [`UploadedFile`]s by id without owning them (spec §3's
/// "Ownership" clause).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: RecognizerKind,
    pub model_size: String,
    pub language: Option<String>,
    pub device: Device,
    pub parameters: RecognitionParams,
    pub diarization: DiarizationConfig,
    pub output_formats: Vec<OutputFormat>,
    pub force_alignment: bool,
    pub alignment_provider: Option<String>,
    pub postprocess: PostprocessOptions,
    pub file_ids: Vec<String>,
    pub status: JobStatus,
    pub progress: u8,
    pub current_file: Option<String>,
    pub total_files: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Job {
    #[must_use]
    pub fn recognizer_key(&self) -> RecognizerKey {
        RecognizerKey::new(self.kind, self.model_size.clone(), self.device, self.parameters.compute_type)
    }
}

/// One `Result` row per `(Job, File)`, per spec §3. `paths` maps a
/// requested output format to the on-disk path of the produced artifact;
/// a format that failed to write (spec §4.3's failure-isolation rule) is
/// simply absent from the map, not recorded as an error here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub id: String,
    pub job_id: String,
    pub file_id: String,
    pub segment_count: u32,
    pub speaker_count: Option<u32>,
    pub paths: std::collections::BTreeMap<OutputFormat, String>,
    pub created_at: DateTime<Utc>,
}
