//! In-memory digest cache
//!
//! Resolution of a fixed reference at a fixed point in time is deterministic,
//! so the cache never needs invalidation within a run: no TTL, no size bound,
//! no persistence. Concurrent stores to the same key are last-writer-wins,
//! which is harmless since racing writers computed the same digest.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::image::Platform;

/// Cache key for a resolved digest.
///
/// Keyed by the reference text as parsed (after prefix stripping and quote
/// trimming) plus the platform constraint, since the same tag resolves to
/// different digests per platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub reference: String,
    pub platform: Option<Platform>,
}

impl CacheKey {
    pub fn new(reference: &str, platform: Option<&Platform>) -> Self {
        Self {
            reference: reference.to_string(),
            platform: platform.cloned(),
        }
    }
}

/// Concurrency-safe map from reference to resolved digest.
///
/// Clones share the underlying map, so one cache can serve parallel
/// line-processing workers.
#[derive(Debug, Clone, Default)]
pub struct DigestCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
}

impl DigestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously resolved digest.
    pub fn load(&self, key: &CacheKey) -> Option<String> {
        match self.entries.read() {
            Ok(guard) => guard.get(key).cloned(),
            // A poisoned lock means a writer panicked mid-insert; treat it
            // as a miss and resolve remotely.
            Err(_) => None,
        }
    }

    /// Record a resolved digest.
    pub fn store(&self, key: CacheKey, digest: String) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(key, digest);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
