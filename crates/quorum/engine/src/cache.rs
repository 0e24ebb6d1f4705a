//! TTL cache for governance verdicts.
//!
//! Keys are BLAKE3 hashes of the canonicalized (query, context) pair; the
//! context is an ordered map, so serialization is stable across calls. The
//! cache is in-process and infallible: a miss always falls through to a
//! fresh computation.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use quorum_types::{Context, GovernanceVerdict};

/// Stable cache key for a (query, context) pair.
pub(crate) fn cache_key(query: &str, context: &Context) -> String {
    // Serialization of (str, BTreeMap) cannot fail
    let canonical =
        serde_json::to_vec(&(query, context)).unwrap_or_else(|_| query.as_bytes().to_vec());
    blake3::hash(&canonical).to_hex().to_string()
}

struct CacheEntry {
    verdict: GovernanceVerdict,
    expires_at: DateTime<Utc>,
}

/// Concurrent verdict cache with per-entry expiry.
///
/// Reads are lock-free per shard; writes serialize per key. Expired entries
/// are evicted on read; `sweep` removes the remainder.
pub struct VerdictCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl VerdictCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Look up a verdict, evicting it if expired.
    ///
    /// A hit returns the stored verdict unchanged.
    pub fn get(&self, key: &str) -> Option<GovernanceVerdict> {
        let expired = match self.entries.get(key) {
            Some(entry) if Utc::now() < entry.expires_at => {
                return Some(entry.verdict.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(key, "Evicting expired cache entry");
            self.entries.remove(key);
        }
        None
    }

    /// Store a verdict with `expires_at = now + ttl`.
    pub fn insert(&self, key: String, verdict: GovernanceVerdict) {
        self.entries.insert(
            key,
            CacheEntry {
                verdict,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
