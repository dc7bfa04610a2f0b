//! Recent-blockhash cache with an explicit freshness tag.
//!
//! Instead of optimistic global caching with background refresh, the
//! cache returns a tagged [`CacheStatus`]: callers see exactly whether
//! they are holding a fresh value or need to refetch, and nothing
//! swaps state behind their back.

use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CacheStatus
// ---------------------------------------------------------------------------

/// Tagged result of a cache read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CacheStatus {
    /// The stored blockhash is within its TTL.
    Fresh(String),
    /// No blockhash stored, or the stored one aged out. Carries the
    /// stale value (if any) for callers that can tolerate it.
    Stale(Option<String>),
}

// ---------------------------------------------------------------------------
// BlockhashCache
// ---------------------------------------------------------------------------

/// Single-slot TTL cache for the most recent blockhash.
pub struct BlockhashCache {
    ttl: Duration,
    slot: Mutex<Option<(String, Instant)>>,
}

impl BlockhashCache {
    /// Creates a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Reads the cache, tagging the result with its freshness.
    pub fn get(&self) -> CacheStatus {
        let slot = self.slot.lock().expect("cache mutex poisoned");
        match slot.as_ref() {
            Some((hash, stored_at)) if stored_at.elapsed() < self.ttl => {
                CacheStatus::Fresh(hash.clone())
            }
            Some((hash, _)) => CacheStatus::Stale(Some(hash.clone())),
            None => CacheStatus::Stale(None),
        }
    }

    /// Stores a newly fetched blockhash, restarting its TTL.
    pub fn store(&self, hash: String) {
        let mut slot = self.slot.lock().expect("cache mutex poisoned");
        *slot = Some((hash, Instant::now()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
