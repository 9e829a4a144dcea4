// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Rendering options for the subtitle/transcript formatter, per spec §4.5.

/// Options governing word-wrap, long-pause breaks, and word highlighting.
/// Defaults match spec §4.5: `max_line_width` effectively unlimited,
/// `max_line_count` unset, no highlighting.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// `None` means "use the spec default of 1000" *and* counts as unset
    /// for the `preserve_segments` decision (spec §4.5 rule (c)).
    pub max_line_width: Option<u32>,
    pub max_line_count: Option<u32>,
    pub highlight_words: bool,
    /// Forces the `HH:` prefix on VTT timestamps even under one hour.
    /// SRT always includes hours regardless of this flag.
    pub always_include_hours: bool,
}

impl WriteOptions {
    pub(crate) const DEFAULT_MAX_LINE_WIDTH: u32 = 1000;

    #[must_use]
    pub(crate) fn effective_max_line_width(&self) -> u32 {
        self.max_line_width.unwrap_or(Self::DEFAULT_MAX_LINE_WIDTH)
    }

    /// Spec §4.5 rule (c): segments are preserved as subtitle boundaries
    /// whenever either bound was left unset by the caller.
    #[must_use]
    pub(crate) fn preserve_segments(&self) -> bool {
        self.max_line_count.is_none() || self.max_line_width.is_none()
    }
}
