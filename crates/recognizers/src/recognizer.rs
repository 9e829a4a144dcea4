// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The recognizer adapter contract of spec §4.1.
//!
//! Generalizes the load/call/unload lifecycle of a native plugin wrapper
//! into an async trait object: `load` is idempotent and transitions the
//! adapter to `ready`, `transcribe` performs one recognition pass, and
//! `unload` releases native/GPU resources and is idempotent as well.

use std::path::Path;

use voxjob_core::{RecognitionParams, RecognizerKind, Transcript};

use crate::error::Result;

/// A loaded (or loadable) recognizer instance.
///
/// Implementations must be safe to call concurrently for `load`/`unload`
/// (the registry serializes these per key, but an adapter should not assume
/// it is the only owner of a reference) and must treat `transcribe` as
/// non-reentrant: the registry/pipeline never issues two concurrent
/// `transcribe` calls against the same instance (spec §5).
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    /// Which kind this adapter implements.
    fn kind(&self) -> RecognizerKind;

    /// Idempotent. Transitions the adapter to `ready`. Fails with
    /// `BackendUnavailable`, `ModelLoadError`, or `ConfigInvalid`.
    async fn load(&self) -> Result<()>;

    /// Performs one recognition pass over `audio_path`. Fails with
    /// `AudioUnreadable`, `BackendTransient` (retryable), or
    /// `BackendPermanent`.
    async fn transcribe(
        &self,
        audio_path: &Path,
        language_hint: Option<&str>,
        params: &RecognitionParams,
    ) -> Result<Transcript>;

    /// Idempotent. Releases native resources and GPU memory. A subsequent
    /// `transcribe` call must call `load()` again first.
    async fn unload(&self) -> Result<()>;
}

/// Runs `f` against a freshly-loaded recognizer and guarantees `unload` is
/// called on every exit path (success, error, or panic-free early return),
/// per spec §4.1's "scoped use" clause. Errors from `unload` are logged but
/// never shadow the result of `f`.
pub async fn scoped<R, F, Fut, T>(recognizer: &R, f: F) -> Result<T>
where
    R: Recognizer + ?Sized,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    recognizer.load().await?;
    let result = f().await;
    if let Err(e) = recognizer.unload().await {
        tracing::warn!(kind = %recognizer.kind(), error = %e, "scoped recognizer unload failed");
    }
    result
}
