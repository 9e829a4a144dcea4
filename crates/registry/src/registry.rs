// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The recognizer registry/cache of spec §4.2.
//!
//! Grounded on the teacher's `ResourceManager`/`ResourceKey`/`get_or_create`
//! shape: a coarse lock guards the cache's structure (insert/remove), while
//! each key gets its own `OnceCell` so construction+`load()` is serialized
//! per key without blocking unrelated keys — the "distinct keys may load in
//! parallel" half of spec §4.2's contract. A strong-count-style refcount on
//! each slot (an explicit `AtomicUsize`, incremented by
//! [`RecognizerHandle`] on acquire and decremented on drop) stands in for
//! the teacher's `Arc<dyn Resource>` sharing, generalized with an in-use
//! guard so `release()` can never drop an adapter while a `transcribe` call
//! is outstanding against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use voxjob_core::{RecognizerKey, RecognizerKind};
use voxjob_recognizers::{BackendsConfig, Recognizer};

use crate::error::{RegistryError, Result};

struct CacheSlot {
    recognizer: OnceCell<Arc<dyn Recognizer>>,
    refcount: AtomicUsize,
}

impl CacheSlot {
    fn new() -> Self {
        Self { recognizer: OnceCell::new(), refcount: AtomicUsize::new(0) }
    }
}

/// Per-kind counts returned by [`Registry::stats`].
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub counts: HashMap<RecognizerKind, usize>,
}

/// The process-wide recognizer cache of spec §4.2.
pub struct Registry {
    entries: Mutex<HashMap<RecognizerKey, Arc<CacheSlot>>>,
    backends: BackendsConfig,
}

/// A live reference to a cached, loaded recognizer. While this handle is
/// alive, [`Registry::release`] will not drop the underlying adapter —
/// dropping the handle decrements the slot's refcount.
pub struct RecognizerHandle {
    recognizer: Arc<dyn Recognizer>,
    slot: Arc<CacheSlot>,
}

impl RecognizerHandle {
    #[must_use]
    pub fn recognizer(&self) -> &Arc<dyn Recognizer> {
        &self.recognizer
    }
}

impl std::ops::Deref for RecognizerHandle {
    type Target = dyn Recognizer;

    fn deref(&self) -> &Self::Target {
        self.recognizer.as_ref()
    }
}

impl Drop for RecognizerHandle {
    fn drop(&mut self) {
        self.slot.refcount.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Registry {
    #[must_use]
    pub fn new(backends: BackendsConfig) -> Self {
        Self { entries: Mutex::new(HashMap::new()), backends }
    }

    /// Returns a handle to a loaded recognizer for `key`, constructing and
    /// loading it if necessary. Concurrent calls with the same `key`
    /// observe exactly one `load()` call and receive handles to the same
    /// underlying instance (spec §8's cache-identity property).
    ///
    /// # Errors
    ///
    /// Returns whatever [`voxjob_recognizers::factory::build`] or the
    /// adapter's `load()` returned; a failed load does not poison the
    /// cache entry — a subsequent `get` retries construction.
    pub async fn get(&self, key: &RecognizerKey) -> Result<RecognizerHandle> {
        let slot = {
            let mut entries = self.entries.lock().await;
            entries.entry(key.clone()).or_insert_with(|| Arc::new(CacheSlot::new())).clone()
        };

        let backends = &self.backends;
        let init = || async {
            let recognizer = voxjob_recognizers::factory::build(key, backends)?;
            recognizer.load().await?;
            Ok::<_, RegistryError>(recognizer)
        };

        let recognizer = match slot.recognizer.get_or_try_init(init).await {
            Ok(recognizer) => recognizer.clone(),
            Err(e) => {
                // A failed construction/load must not poison the cache:
                // drop the slot so the next `get` starts fresh.
                let mut entries = self.entries.lock().await;
                if let Some(current) = entries.get(key) {
                    if Arc::ptr_eq(current, &slot) {
                        entries.remove(key);
                    }
                }
                return Err(e);
            },
        };

        slot.refcount.fetch_add(1, Ordering::SeqCst);
        Ok(RecognizerHandle { recognizer, slot })
    }

    /// Unloads all cached adapters matching `kind` (or all kinds if
    /// `None`), per spec §4.2. Entries with outstanding [`RecognizerHandle`]
    /// references (refcount > 0) are left in place — `release` never drops
    /// an adapter mid-`transcribe`.
    ///
    /// # Errors
    ///
    /// Returns the first `unload()` error encountered; entries that failed
    /// to unload are still removed from the cache's bookkeeping map (the
    /// adapter itself will drop once its last `Arc` reference is gone).
    pub async fn release(&self, kind: Option<RecognizerKind>) -> Result<()> {
        let to_remove: Vec<RecognizerKey> = {
            let entries = self.entries.lock().await;
            entries
                .iter()
                .filter(|(k, slot)| {
                    kind.is_none_or(|kind| k.kind == kind) && slot.refcount.load(Ordering::SeqCst) == 0
                })
                .map(|(k, _)| k.clone())
                .collect()
        };

        let mut first_err = None;
        for key in to_remove {
            let slot = {
                let mut entries = self.entries.lock().await;
                entries.remove(&key)
            };
            let Some(slot) = slot else { continue };
            if let Some(recognizer) = slot.recognizer.get() {
                if let Err(e) = recognizer.unload().await {
                    tracing::warn!(%key, error = %e, "failed to unload recognizer during release");
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Per-kind counts of currently cached adapters.
    pub async fn stats(&self) -> RegistryStats {
        let entries = self.entries.lock().await;
        let mut counts = HashMap::new();
        for key in entries.keys() {
            *counts.entry(key.kind).or_insert(0) += 1;
        }
        RegistryStats { counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxjob_core::Device;

    #[tokio::test]
    async fn concurrent_get_same_key_loads_exactly_once_and_shares_instance() {
        let registry = Registry::new(BackendsConfig::default());
        let key = RecognizerKey::new(RecognizerKind::FasterWhisper, "base", Device::Cpu, None);

        let (h1, h2, h3) =
            tokio::join!(registry.get(&key), registry.get(&key), registry.get(&key));
        let h1 = h1.unwrap();
        let h2 = h2.unwrap();
        let h3 = h3.unwrap();

        assert!(Arc::ptr_eq(h1.recognizer(), h2.recognizer()));
        assert!(Arc::ptr_eq(h2.recognizer(), h3.recognizer()));
    }

    #[tokio::test]
    async fn release_skips_entries_with_live_handles() {
        let registry = Registry::new(BackendsConfig::default());
        let key = RecognizerKey::new(RecognizerKind::OriginWhisper, "base", Device::Cpu, None);
        let handle = registry.get(&key).await.unwrap();

        registry.release(Some(RecognizerKind::OriginWhisper)).await.unwrap();
        let stats = registry.stats().await;
        assert_eq!(stats.counts.get(&RecognizerKind::OriginWhisper), Some(&1));

        drop(handle);
        registry.release(Some(RecognizerKind::OriginWhisper)).await.unwrap();
        let stats = registry.stats().await;
        assert_eq!(stats.counts.get(&RecognizerKind::OriginWhisper), None);
    }

    #[tokio::test]
    async fn failed_construction_does_not_poison_the_cache() {
        let mut config = BackendsConfig::default();
        config.enabled.remove(&RecognizerKind::OriginWhisper);
        let registry = Registry::new(config);
        let key = RecognizerKey::new(RecognizerKind::OriginWhisper, "base", Device::Cpu, None);

        assert!(registry.get(&key).await.is_err());
        let stats = registry.stats().await;
        assert_eq!(stats.counts.get(&RecognizerKind::OriginWhisper), None);
    }

    #[tokio::test]
    async fn distinct_keys_cache_independently() {
        let registry = Registry::new(BackendsConfig::default());
        let key_a = RecognizerKey::new(RecognizerKind::OriginWhisper, "base", Device::Cpu, None);
        let key_b = RecognizerKey::new(RecognizerKind::OriginWhisper, "large-v3", Device::Cpu, None);

        let a = registry.get(&key_a).await.unwrap();
        let b = registry.get(&key_b).await.unwrap();
        assert!(!Arc::ptr_eq(a.recognizer(), b.recognizer()));

        let stats = registry.stats().await;
        assert_eq!(stats.counts.get(&RecognizerKind::OriginWhisper), Some(&2));
    }
}
