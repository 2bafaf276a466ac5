/// Configuration management for the results proxy
use crate::error::{ProxyError, ProxyResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub upstream: UpstreamConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Upstream results API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the college site (e.g., https://academic.manit.ac.in)
    pub base_url: String,
    /// Path of the "get student data" endpoint (returns the FormId)
    pub student_data_path: String,
    /// Path of the "get student result" endpoint
    pub student_result_path: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Idle keep-alive sockets kept per host
    pub max_connections: usize,
    /// The upstream is a legacy internal host whose certificate does not
    /// pass standard validation. Accepting it is a deliberate trust decision.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

/// Retry policy for upstream calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub base_delay_ms: u64,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. "info" or "scholar_results_proxy=debug"
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://academic.manit.ac.in".to_string(),
            student_data_path: "/api/StudentActivity/GetStudentData".to_string(),
            student_result_path: "/api/StudentActivity/GetStudentResult".to_string(),
            timeout_secs: 10,
            max_connections: 50,
            accept_invalid_certs: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 400,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 6 * 60 * 60,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LoggingConfig {
    /// Tracing filter built from `level`; malformed directives fall back to
    /// the default filter
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Read an env var and parse it, falling back to `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "scholar_results_proxy=debug,tower_http=debug";

/// Recognised boolean spellings, case-insensitive
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean env var; an unrecognised value is a startup error rather
/// than a silent fall back to the default
fn env_flag(key: &str, default: bool) -> ProxyResult<bool> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => parse_flag(&raw).ok_or_else(|| {
            ProxyError::Validation(format!("{} must be true or false, got {:?}", key, raw))
        }),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ProxyResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PROXY_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PROXY_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ProxyError::Validation("Invalid port number".to_string()))?;

        let upstream_defaults = UpstreamConfig::default();
        let upstream = UpstreamConfig {
            base_url: env::var("PROXY_UPSTREAM_BASE_URL")
                .unwrap_or(upstream_defaults.base_url),
            student_data_path: env::var("PROXY_UPSTREAM_STUDENT_DATA_PATH")
                .unwrap_or(upstream_defaults.student_data_path),
            student_result_path: env::var("PROXY_UPSTREAM_STUDENT_RESULT_PATH")
                .unwrap_or(upstream_defaults.student_result_path),
            timeout_secs: env_or("PROXY_UPSTREAM_TIMEOUT_SECS", upstream_defaults.timeout_secs),
            max_connections: env_or(
                "PROXY_UPSTREAM_MAX_CONNECTIONS",
                upstream_defaults.max_connections,
            ),
            accept_invalid_certs: env_flag(
                "PROXY_UPSTREAM_ACCEPT_INVALID_CERTS",
                upstream_defaults.accept_invalid_certs,
            )?,
            user_agent: env::var("PROXY_UPSTREAM_USER_AGENT")
                .unwrap_or(upstream_defaults.user_agent),
        };

        let retry_defaults = RetryConfig::default();
        let retry = RetryConfig {
            max_retries: env_or("PROXY_RETRY_MAX_RETRIES", retry_defaults.max_retries),
            base_delay_ms: env_or("PROXY_RETRY_BASE_DELAY_MS", retry_defaults.base_delay_ms),
        };

        let cache = CacheConfig {
            ttl_secs: env_or("PROXY_CACHE_TTL_SECS", CacheConfig::default().ttl_secs),
        };

        let log_level = env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let log_format = env::var("PROXY_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            upstream,
            retry,
            cache,
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ProxyResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ProxyError::Validation("Hostname cannot be empty".to_string()));
        }

        let base = self.upstream.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProxyError::Validation(format!(
                "Upstream base URL must be http(s): {:?}",
                self.upstream.base_url
            )));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ProxyError::Validation(
                "Upstream timeout must be at least 1 second".to_string(),
            ));
        }

        if self.upstream.max_connections == 0 {
            return Err(ProxyError::Validation(
                "Upstream connection limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
