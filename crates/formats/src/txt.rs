// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Plain-text output, per spec §4.5: one stripped line per segment, with
//! the same `[<speaker>]: ` prefix as the subtitle formats.

use voxjob_core::{OutputFormat, Transcript};

use crate::error::Result;
use crate::options::WriteOptions;
use crate::writer::Formatter;

pub struct TxtFormatter;

impl Formatter for TxtFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Txt
    }

    fn render(&self, transcript: &Transcript, _options: &WriteOptions) -> Result<String> {
        let mut out = String::new();
        for segment in &transcript.segments {
            let text = segment.text.trim();
            match &segment.speaker {
                Some(speaker) => out.push_str(&format!("[{speaker}]: {text}")),
                None => out.push_str(text),
            }
            out.push('\n');
        }
        Ok(out)
    }
}
