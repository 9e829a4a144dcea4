// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use voxjob_core::RecognizerKey;

use crate::backends::BackendsConfig;
use crate::error::{RecognizerError, Result};
use crate::fast_conformer::FastConformerRecognizer;
use crate::recognizer::Recognizer;
use crate::stub::StubRecognizer;

/// Constructs (but does not `load`) the adapter for `key.kind`, per spec
/// §4.2's "construction of a disabled or missing backend fails with
/// `BackendDisabled` / `BackendUnavailable` and does not poison the cache."
///
/// # Errors
///
/// Returns `BackendDisabled` if `key.kind` is not in `config.enabled`, or
/// `BackendUnavailable`/`ConfigInvalid` if a subprocess/cloud kind is
/// enabled but missing its required configuration.
pub fn build(key: &RecognizerKey, config: &BackendsConfig) -> Result<Arc<dyn Recognizer>> {
    if !config.is_enabled(key.kind) {
        return Err(RecognizerError::BackendDisabled(key.kind.to_string()));
    }

    if key.kind.is_subprocess() {
        let fc_config = config
            .fast_conformer
            .clone()
            .ok_or_else(|| RecognizerError::BackendUnavailable("fast_conformer container is not configured".to_string()))?;
        return Ok(Arc::new(FastConformerRecognizer::new(fc_config)));
    }

    Ok(Arc::new(StubRecognizer::new(key.kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::{Device, RecognizerKind};

    #[test]
    fn disabled_kind_is_rejected() {
        let mut config = BackendsConfig::default();
        config.enabled.remove(&RecognizerKind::OriginWhisper);
        let key = RecognizerKey::new(RecognizerKind::OriginWhisper, "base", Device::Cpu, None);
        assert!(matches!(build(&key, &config), Err(RecognizerError::BackendDisabled(_))));
    }

    #[test]
    fn enabled_stub_kind_builds() {
        let config = BackendsConfig::default();
        let key = RecognizerKey::new(RecognizerKind::FasterWhisper, "base", Device::Cpu, None);
        assert!(build(&key, &config).is_ok());
    }

    #[test]
    fn unconfigured_fast_conformer_is_unavailable() {
        let mut config = BackendsConfig::default();
        config.enabled.insert(RecognizerKind::FastConformer);
        let key = RecognizerKey::new(RecognizerKind::FastConformer, "xlarge", Device::Cuda, None);
        assert!(matches!(build(&key, &config), Err(RecognizerError::BackendUnavailable(_))));
    }
}
