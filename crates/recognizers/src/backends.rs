// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Which recognizer kinds are enabled, and their kind-specific
//! configuration. External providers (cloud STT, NeMo container, Triton,
//! Riva) are feature-flagged here per spec §4.1; a kind absent from
//! `enabled` refuses construction with `BackendDisabled`, never a silent
//! default (spec §6's "no surprise defaults").

use std::collections::HashSet;

use voxjob_core::RecognizerKind;

use crate::fast_conformer::FastConformerConfig;

/// Backend enablement and kind-specific configuration, loaded from
/// `voxjob-server`'s configuration layer.
#[derive(Debug, Clone)]
pub struct BackendsConfig {
    pub enabled: HashSet<RecognizerKind>,
    pub fast_conformer: Option<FastConformerConfig>,
}

impl Default for BackendsConfig {
    /// Every in-process (non-subprocess) kind is enabled by default since
    /// they only require the scaffold adapter of §9 to exist; the
    /// subprocess and cloud kinds require explicit container/credential
    /// configuration and are disabled until configured.
    fn default() -> Self {
        let enabled = RecognizerKind::ALL.iter().copied().filter(|k| !k.is_subprocess()).collect();
        Self { enabled, fast_conformer: None }
    }
}

impl BackendsConfig {
    #[must_use]
    pub fn is_enabled(&self, kind: RecognizerKind) -> bool {
        self.enabled.contains(&kind)
    }
}
