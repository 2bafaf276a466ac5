/// Student Result Lookup
///
/// Two-step upstream resolution (scholar number -> FormId -> result records)
/// with retry/backoff, fronted by a time-bounded in-memory cache.

pub mod cache;
pub mod resolver;
pub mod retry;

pub use cache::ResultCache;
pub use resolver::UpstreamResolver;
pub use retry::RetryPolicy;

use crate::error::ProxyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result records exactly as upstream returned them.
///
/// The proxy never interprets the record shape; the UI does.
pub type ResultPayload = serde_json::Value;

/// Cached result entry
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub payload: ResultPayload,
    pub cached_at: DateTime<Utc>,
}

/// A cache hit together with how long it stays fresh
#[derive(Debug, Clone)]
pub struct FreshResult {
    pub payload: ResultPayload,
    pub remaining: std::time::Duration,
}

/// Resolves a scholar number into its result records.
///
/// `Ok(None)` means upstream has no record for the scholar number. Errors are
/// reserved for upstream failures and unexpected response shapes.
#[async_trait]
pub trait ResultResolver: Send + Sync {
    async fn resolve(&self, scholar_no: &str) -> ProxyResult<Option<ResultPayload>>;
}
