// ── TTL-bounded payload cache ──
//
// Address-keyed store of previously retrieved payloads. Keys are a
// stable 64-bit hash of the full resolved path, which bounds key size;
// the scope label rides along for scope-wide invalidation. Expiry is
// checked lazily on access; there is no background sweeper. Strictly
// additive to correctness: disabling the cache changes cost, never
// outcomes.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::payload::Payload;

/// Default time-to-live for cached entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    payload: Payload,
    scope: String,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    // Valid iff now - inserted_at < ttl; expired entries are treated
    // as absent and never surfaced.
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Shared payload cache, safe for concurrent readers and writers.
pub struct ConfigCache {
    entries: DashMap<u64, CacheEntry>,
}

fn key_for(path: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

impl ConfigCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a payload; expired entries are removed and reported absent.
    pub fn get(&self, path: &str) -> Option<Payload> {
        let key = key_for(path);
        let now = Instant::now();

        let expired = match self.entries.get(&key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                debug!(path, "cache hit");
                return Some(entry.payload.clone());
            }
            None => false,
        };
        if expired {
            self.entries.remove(&key);
        }
        debug!(path, "cache miss");
        None
    }

    /// Store a payload with the default TTL.
    pub fn put(&self, path: &str, scope: &str, payload: Payload) {
        self.put_with_ttl(path, scope, payload, DEFAULT_TTL);
    }

    /// Store a payload with a caller-chosen TTL.
    pub fn put_with_ttl(&self, path: &str, scope: &str, payload: Payload, ttl: Duration) {
        self.entries.insert(
            key_for(path),
            CacheEntry {
                payload,
                scope: scope.to_owned(),
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove the entry for one path. Idempotent: removing an absent
    /// entry is a valid zero-count outcome, not a fault.
    pub fn invalidate(&self, path: &str) -> usize {
        usize::from(self.entries.remove(&key_for(path)).is_some())
    }

    /// Remove every entry belonging to the given scope label.
    pub fn invalidate_scope(&self, scope: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.scope != scope);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewind every entry's insertion time, simulating the passage of
    /// time without sleeping.
    #[cfg(test)]
    pub(crate) fn backdate(&self, by: Duration) {
        for mut entry in self.entries.iter_mut() {
            entry.inserted_at -= by;
        }
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}
