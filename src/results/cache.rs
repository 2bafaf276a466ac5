/// Result Cache - in-memory TTL store keyed by scholar number
use crate::results::{CachedResult, FreshResult, ResultPayload};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Result cache manager
///
/// Expired entries are never evicted, only ignored on read and replaced by
/// the next `put` for the same scholar number. Entries live for the life of
/// the process.
pub struct ResultCache {
    entries: RwLock<HashMap<String, CachedResult>>,
    /// TTL for cached results (default: 6 hours)
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::hours(6))
    }
}

impl ResultCache {
    /// Create a new result cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a cache from a std duration, clamping values chrono cannot represent
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self::new(Duration::from_std(ttl).unwrap_or(Duration::MAX))
    }

    pub fn ttl(&self) -> std::time::Duration {
        self.ttl.to_std().unwrap_or_default()
    }

    /// Get cached payload if it is still fresh
    pub async fn get(&self, scholar_no: &str) -> Option<ResultPayload> {
        self.lookup(scholar_no).await.map(|fresh| fresh.payload)
    }

    /// Get cached payload and its remaining freshness window
    pub async fn lookup(&self, scholar_no: &str) -> Option<FreshResult> {
        let entries = self.entries.read().await;
        let entry = entries.get(scholar_no)?;

        let age = Utc::now() - entry.cached_at;
        if age >= self.ttl {
            debug!(scholar_no, age_secs = age.num_seconds(), "cached result expired");
            return None;
        }

        Some(FreshResult {
            payload: entry.payload.clone(),
            // A timestamp from the future (clock step) counts as age zero
            remaining: (self.ttl - age.max(Duration::zero()))
                .to_std()
                .unwrap_or_default(),
        })
    }

    /// Cache a payload, replacing any prior entry
    pub async fn put(&self, scholar_no: &str, payload: ResultPayload) {
        self.put_at(scholar_no, payload, Utc::now()).await;
    }

    /// Cache a payload with an explicit creation time
    pub async fn put_at(&self, scholar_no: &str, payload: ResultPayload, cached_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            scholar_no.to_string(),
            CachedResult { payload, cached_at },
        );
        crate::metrics::RESULT_CACHE_ENTRIES.set(entries.len() as i64);
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
