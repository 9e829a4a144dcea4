// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! WebVTT output, per spec §4.5 and testable-properties scenario 1.

use voxjob_core::{OutputFormat, Transcript};

use crate::error::Result;
use crate::options::WriteOptions;
use crate::subtitles::iterate_cues;
use crate::writer::Formatter;

pub struct VttFormatter;

impl Formatter for VttFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Vtt
    }

    fn render(&self, transcript: &Transcript, options: &WriteOptions) -> Result<String> {
        let cues = iterate_cues(transcript, options, options.always_include_hours, '.')?;
        let mut out = String::from("WEBVTT\n\n");
        for cue in cues {
            out.push_str(&cue.start);
            out.push_str(" --> ");
            out.push_str(&cue.end);
            out.push('\n');
            out.push_str(&cue.text);
            out.push_str("\n\n");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::Segment;

    #[test]
    fn two_segment_transcript_matches_spec_scenario_one() {
        let transcript = Transcript {
            segments: vec![Segment::new(0.0, 2.5, " Hello"), Segment::new(2.5, 5.0, " World")],
        };
        let rendered = VttFormatter.render(&transcript, &WriteOptions::default()).unwrap();
        assert_eq!(
            rendered,
            "WEBVTT\n\n00:00.000 --> 00:02.500\nHello\n\n00:02.500 --> 00:05.000\nWorld\n\n"
        );
    }
}
