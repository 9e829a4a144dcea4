// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Tab-separated-values output, per spec §4.5 and testable-properties
//! scenario 4. Times are integer milliseconds; the `speaker` field is
//! dropped entirely (the spec's "TSV drops it" clause) — no column, no
//! prefix.

use voxjob_core::{OutputFormat, Transcript};

use crate::error::Result;
use crate::options::WriteOptions;
use crate::writer::Formatter;

pub struct TsvFormatter;

impl Formatter for TsvFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tsv
    }

    fn render(&self, transcript: &Transcript, _options: &WriteOptions) -> Result<String> {
        let mut out = String::from("start\tend\ttext\n");
        for segment in &transcript.segments {
            let start_ms = (segment.start * 1000.0).round() as i64;
            let end_ms = (segment.end * 1000.0).round() as i64;
            let text = segment.text.trim().replace('\t', " ");
            out.push_str(&start_ms.to_string());
            out.push('\t');
            out.push_str(&end_ms.to_string());
            out.push('\t');
            out.push_str(&text);
            out.push('\n');
        }
        Ok(out)
    }
}
