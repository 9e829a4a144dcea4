// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! JSON output, per spec §4.5: the canonical transcript, UTF-8, indented 2,
//! non-ASCII preserved verbatim (not `\uXXXX`-escaped).

use voxjob_core::{OutputFormat, Transcript};

use crate::error::{FormatError, Result};
use crate::options::WriteOptions;
use crate::writer::Formatter;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn render(&self, transcript: &Transcript, _options: &WriteOptions) -> Result<String> {
        serde_json::to_string_pretty(transcript).map_err(FormatError::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::Segment;

    #[test]
    fn round_trips_the_canonical_transcript() {
        let mut segment = Segment::new(0.0, 1.0, "hi");
        segment.speaker = Some("발언자_0".to_string());
        let transcript = Transcript { segments: vec![segment] };
        let rendered = JsonFormatter.render(&transcript, &WriteOptions::default()).unwrap();
        let parsed: Transcript = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].speaker.as_deref(), Some("발언자_0"));
    }

    #[test]
    fn non_ascii_is_preserved_verbatim() {
        let transcript = Transcript { segments: vec![Segment::new(0.0, 1.0, "발언자")] };
        let rendered = JsonFormatter.render(&transcript, &WriteOptions::default()).unwrap();
        assert!(rendered.contains("발언자"));
        assert!(!rendered.contains("\\u"));
    }
}
