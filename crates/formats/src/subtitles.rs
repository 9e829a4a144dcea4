// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The word-wrap / long-pause / segment-break state machine shared by the
//! VTT and SRT writers, ported line-for-line from
//! `original_source/backend/app/core/processors/formatters.py`'s
//! `SubtitlesWriter.iterate_result`.
//!
//! Word-level rendering only engages when *every* segment carries a
//! non-empty word list (spec §4.5's stated gate — a deliberate narrowing of
//! the Python original, which only inspected the first segment; recorded as
//! an Open Question resolution in `DESIGN.md`). Otherwise rendering falls
//! back to one cue per segment.

use voxjob_core::time::format_timestamp;
use voxjob_core::{Segment, Transcript};

use crate::options::WriteOptions;

/// One rendered subtitle cue, with already-formatted timestamps (VTT and
/// SRT differ in decimal marker and hour inclusion, so cues are produced
/// per output format rather than shared as raw floats).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start: String,
    pub end: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct WordTiming {
    word: String,
    start: Option<f64>,
    end: Option<f64>,
}

fn word_level_eligible(segments: &[Segment]) -> bool {
    !segments.is_empty() && segments.iter().all(|s| s.words.as_ref().is_some_and(|w| !w.is_empty()))
}

/// Groups words into subtitle cues per spec §4.5 rule (a)-(c), before any
/// per-format timestamp rendering or highlight expansion.
fn group_words(segments: &[Segment], options: &WriteOptions) -> Vec<(Vec<WordTiming>, Vec<(f64, f64, Option<String>)>)> {
    let max_line_width = options.effective_max_line_width() as usize;
    let max_line_count = options.max_line_count;
    let preserve_segments = options.preserve_segments();

    let mut groups = Vec::new();
    let mut line_len: usize = 0;
    let mut line_count: u32 = 1;
    let mut subtitle: Vec<WordTiming> = Vec::new();
    let mut times: Vec<(f64, f64, Option<String>)> = Vec::new();
    let mut last = segments[0].start;

    for segment in segments {
        let Some(words) = segment.words.as_ref() else { continue };
        if words.is_empty() {
            continue;
        }

        for (i, original) in words.iter().enumerate() {
            let mut word_text = original.word.clone();
            let mut start = Some(original.start);
            let end = Some(original.end);

            let long_pause = !preserve_segments && start.is_some_and(|s| s - last > 3.0);
            let has_room = line_len + word_text.len() <= max_line_width;
            let seg_break = i == 0 && !subtitle.is_empty() && preserve_segments;

            if line_len > 0 && has_room && !long_pause && !seg_break {
                line_len += word_text.len();
            } else {
                word_text = word_text.trim().to_string();
                let breaks_subtitle =
                    (!subtitle.is_empty() && max_line_count.is_some() && (long_pause || line_count >= max_line_count.unwrap_or(u32::MAX)))
                        || seg_break;
                if breaks_subtitle {
                    groups.push((std::mem::take(&mut subtitle), std::mem::take(&mut times)));
                    line_count = 1;
                } else if line_len > 0 {
                    line_count += 1;
                    word_text = format!("\n{word_text}");
                }
                line_len = word_text.trim().len();
            }

            subtitle.push(WordTiming { word: word_text, start, end });
            times.push((segment.start, segment.end, segment.speaker.clone()));
            if let Some(s) = start.take() {
                last = s;
            }
        }
    }

    if !subtitle.is_empty() {
        groups.push((subtitle, times));
    }

    groups
}

/// Renders `transcript` into subtitle cues using the given timestamp
/// formatting (decimal marker, forced hours) — spec §4.5's full word-wrap
/// and speaker-prefix rules.
///
/// # Errors
///
/// Returns [`FormatError::NegativeTimestamp`] if any segment or word in
/// `transcript` carries a negative start/end — a recognizer backend
/// (including an external subprocess) can emit that even though no
/// recognizer in this workspace produces it by design.
pub fn iterate_cues(
    transcript: &Transcript,
    options: &WriteOptions,
    always_include_hours: bool,
    decimal_marker: char,
) -> crate::error::Result<Vec<Cue>> {
    let fmt = |t: f64| {
        format_timestamp(t, always_include_hours, decimal_marker).map_err(crate::error::FormatError::NegativeTimestamp)
    };

    if !word_level_eligible(&transcript.segments) {
        return transcript
            .segments
            .iter()
            .map(|segment| {
                let text = segment.text.trim().replace("-->", "->");
                let text = match &segment.speaker {
                    Some(speaker) => format!("[{speaker}]: {text}"),
                    None => text,
                };
                Ok(Cue { start: fmt(segment.start)?, end: fmt(segment.end)?, text })
            })
            .collect();
    }

    let groups = group_words(&transcript.segments, options);
    let mut cues = Vec::new();

    for (subtitle, times) in groups {
        let (sstart, ssend, speaker) = times[0].clone();
        let subtitle_start = fmt(sstart)?;
        let subtitle_end = fmt(ssend)?;
        let subtitle_text = subtitle.iter().map(|w| w.word.as_str()).collect::<Vec<_>>().join(" ");
        let has_timing = subtitle.iter().any(|w| w.start.is_some());
        let prefix = speaker.map(|s| format!("[{s}]: ")).unwrap_or_default();

        if options.highlight_words && has_timing {
            let mut last_end = subtitle_start.clone();
            let all_words: Vec<&str> = subtitle.iter().map(|w| w.word.as_str()).collect();

            for (i, word) in subtitle.iter().enumerate() {
                let Some(wstart) = word.start else { continue };
                let start_s = fmt(wstart)?;
                let end_s = fmt(word.end.unwrap_or(wstart))?;

                if last_end != start_s {
                    cues.push(Cue { start: last_end.clone(), end: start_s.clone(), text: subtitle_text.clone() });
                }

                let highlighted = all_words
                    .iter()
                    .enumerate()
                    .map(|(j, w)| if j == i { format!("<u>{w}</u>") } else { (*w).to_string() })
                    .collect::<Vec<_>>()
                    .join(" ");
                cues.push(Cue { start: start_s, end: end_s.clone(), text: format!("{prefix}{highlighted}") });
                last_end = end_s;
            }
        } else {
            cues.push(Cue { start: subtitle_start, end: subtitle_end, text: format!("{prefix}{subtitle_text}") });
        }
    }

    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::{Segment, Word};

    fn segment_no_words(start: f64, end: f64, text: &str) -> Segment {
        Segment::new(start, end, text)
    }

    #[test]
    fn segment_level_cues_trim_text_and_escape_arrows() {
        let transcript = Transcript { segments: vec![segment_no_words(0.0, 2.5, " Hello --> World ")] };
        let cues = iterate_cues(&transcript, &WriteOptions::default(), false, '.').unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Hello -> World");
    }

    #[test]
    fn speaker_prefix_applies_to_segment_level_cues() {
        let mut segment = segment_no_words(0.0, 2.0, "hi");
        segment.speaker = Some("발언자_0".to_string());
        let transcript = Transcript { segments: vec![segment] };
        let cues = iterate_cues(&transcript, &WriteOptions::default(), false, '.').unwrap();
        assert_eq!(cues[0].text, "[발언자_0]: hi");
    }

    #[test]
    fn word_level_requires_every_segment_to_have_words() {
        let with_words =
            Segment { words: Some(vec![Word { start: 0.0, end: 1.0, word: " Hi".to_string() }]), ..segment_no_words(0.0, 1.0, " Hi") };
        let without_words = segment_no_words(1.0, 2.0, " there");
        let transcript = Transcript { segments: vec![with_words, without_words] };
        let cues = iterate_cues(&transcript, &WriteOptions::default(), false, '.').unwrap();
        // Falls back to segment-level cues (2 of them) since not every segment has words.
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn long_pause_breaks_into_separate_subtitles_when_segments_not_preserved() {
        let words = vec![
            Word { start: 0.0, end: 0.5, word: " Hello".to_string() },
            Word { start: 5.0, end: 5.5, word: " World".to_string() },
        ];
        let segment = Segment { words: Some(words), ..segment_no_words(0.0, 5.5, "") };
        let transcript = Transcript { segments: vec![segment] };
        let options = WriteOptions { max_line_width: Some(100), max_line_count: Some(10), ..Default::default() };
        let cues = iterate_cues(&transcript, &options, false, '.').unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hello");
        assert_eq!(cues[1].text, "World");
    }

    #[test]
    fn highlight_words_wraps_current_word_and_emits_filler_gaps() {
        let words = vec![
            Word { start: 0.0, end: 0.5, word: " Hello".to_string() },
            Word { start: 2.0, end: 2.5, word: " World".to_string() },
        ];
        let segment = Segment { words: Some(words), ..segment_no_words(0.0, 2.5, "") };
        let transcript = Transcript { segments: vec![segment] };
        let options = WriteOptions { highlight_words: true, ..Default::default() };
        let cues = iterate_cues(&transcript, &options, false, '.').unwrap();
        // filler (0.0->0.0 collapses since start==subtitle_start), word1, filler gap, word2
        assert!(cues.iter().any(|c| c.text.contains("<u>Hello</u>")));
        assert!(cues.iter().any(|c| c.text.contains("<u>World</u>")));
        assert!(cues.iter().any(|c| !c.text.contains("<u>"))); // the filler cue
    }

    #[test]
    fn negative_segment_start_is_rejected_not_panicked() {
        let transcript = Transcript { segments: vec![segment_no_words(-1.0, 2.0, "hi")] };
        let err = iterate_cues(&transcript, &WriteOptions::default(), false, '.').unwrap_err();
        assert!(matches!(err, crate::error::FormatError::NegativeTimestamp(t) if t == -1.0));
    }
}
