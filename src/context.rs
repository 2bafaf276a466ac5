/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    error::ProxyResult,
    results::{ResultCache, ResultResolver, RetryPolicy, UpstreamResolver},
};
use std::sync::Arc;
use std::time::Instant;

/// Application context holding all shared services
///
/// Created once at startup and cloned into every request. The result cache
/// is the only shared mutable state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub cache: Arc<ResultCache>,
    pub resolver: Arc<dyn ResultResolver>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> ProxyResult<Self> {
        // Validate configuration
        config.validate()?;

        let retry = RetryPolicy::from_config(&config.retry);
        let resolver = Arc::new(UpstreamResolver::new(&config.upstream, retry)?);

        tracing::info!(
            base_url = %config.upstream.base_url,
            timeout_secs = config.upstream.timeout_secs,
            max_retries = config.retry.max_retries,
            "Upstream resolver initialized"
        );

        Ok(Self::with_resolver(config, resolver))
    }

    /// Create a context around an existing resolver
    pub fn with_resolver(config: ServerConfig, resolver: Arc<dyn ResultResolver>) -> Self {
        let cache = Arc::new(ResultCache::with_ttl(config.cache.ttl()));

        Self {
            config: Arc::new(config),
            cache,
            resolver,
            started_at: Instant::now(),
        }
    }

    /// Get service address
    pub fn service_addr(&self) -> String {
        format!(
            "{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
