// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! SubRip output, per spec §4.5 and testable-properties scenario 2. SRT
//! always includes hours, per the spec's timestamp-formatting rule.

use voxjob_core::{OutputFormat, Transcript};

use crate::error::Result;
use crate::options::WriteOptions;
use crate::subtitles::iterate_cues;
use crate::writer::Formatter;

pub struct SrtFormatter;

impl Formatter for SrtFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Srt
    }

    fn render(&self, transcript: &Transcript, options: &WriteOptions) -> Result<String> {
        let cues = iterate_cues(transcript, options, true, ',')?;
        let mut out = String::new();
        for (i, cue) in cues.into_iter().enumerate() {
            out.push_str(&(i + 1).to_string());
            out.push('\n');
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
    fn hours_are_always_rendered_per_spec_scenario_two() {
        let transcript = Transcript { segments: vec![Segment::new(3600.0, 3601.5, " One")] };
        let rendered = SrtFormatter.render(&transcript, &WriteOptions::default()).unwrap();
        assert_eq!(rendered, "1\n01:00:00,000 --> 01:00:01,500\nOne\n\n");
    }

    #[test]
    fn indices_are_one_based_and_sequential() {
        let transcript = Transcript {
            segments: vec![Segment::new(0.0, 1.0, "a"), Segment::new(1.0, 2.0, "b"), Segment::new(2.0, 3.0, "c")],
        };
        let rendered = SrtFormatter.render(&transcript, &WriteOptions::default()).unwrap();
        assert!(rendered.starts_with("1\n"));
        assert!(rendered.contains("\n2\n"));
        assert!(rendered.contains("\n3\n"));
    }
}
