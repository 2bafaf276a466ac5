/// Upstream Resolver - scholar number -> FormId -> result records
use crate::{
    config::UpstreamConfig,
    error::{ProxyError, ProxyResult},
    metrics,
    results::{ResultPayload, ResultResolver, RetryPolicy},
};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

const STUDENT_DATA_CALL: &str = "student_data";
const STUDENT_RESULT_CALL: &str = "student_result";

/// HTTP resolver against the college results API
///
/// One `reqwest::Client` is shared by every call so keep-alive connections
/// are pooled. Concurrent upstream requests are capped by a semaphore sized
/// to the configured connection limit.
#[derive(Clone)]
pub struct UpstreamResolver {
    http_client: reqwest::Client,
    student_data_url: String,
    student_result_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl UpstreamResolver {
    /// Create a new upstream resolver
    pub fn new(config: &UpstreamConfig, retry: RetryPolicy) -> ProxyResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );

        // danger_accept_invalid_certs: the upstream is a legacy internal host
        // whose certificate chain fails validation. Controlled by
        // PROXY_UPSTREAM_ACCEPT_INVALID_CERTS.
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .pool_max_idle_per_host(config.max_connections)
            .tcp_keepalive(Duration::from_secs(60))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        if config.accept_invalid_certs {
            warn!(
                base_url = %config.base_url,
                "upstream TLS certificate validation is disabled"
            );
        }

        Ok(Self {
            http_client,
            student_data_url: join_url(&config.base_url, &config.student_data_path),
            student_result_url: join_url(&config.base_url, &config.student_result_path),
            timeout: config.timeout(),
            retry,
            permits: Arc::new(Semaphore::new(config.max_connections.max(1))),
        })
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET `url` with the retry policy applied to transport failures.
    ///
    /// Any HTTP status is a successful call here; the caller decides what a
    /// status means.
    async fn fetch(
        &self,
        call: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> ProxyResult<(StatusCode, Vec<u8>)> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProxyError::Internal("upstream connection limiter closed".to_string()))?;

        let result = self
            .retry
            .run(call, is_transient, || async move {
                let response = self
                    .http_client
                    .get(url)
                    .query(query)
                    .timeout(self.timeout)
                    .send()
                    .await?;

                let status = response.status();
                let body = response.bytes().await?;
                Ok::<_, reqwest::Error>((status, body.to_vec()))
            })
            .await;

        match result {
            Ok((status, body)) => {
                metrics::record_upstream_call(call, status.as_str());
                Ok((status, body))
            }
            Err(e) => {
                metrics::record_upstream_call(call, "error");
                warn!(call, error = %e, "upstream call failed");
                Err(ProxyError::upstream(
                    e.status().map(|s| s.as_u16()),
                    format!("{} call failed: {}", call, e),
                ))
            }
        }
    }

    /// First call: scholar number -> FormId. `None` when upstream has no record.
    async fn fetch_form_id(&self, scholar_no: &str) -> ProxyResult<Option<String>> {
        info!(scholar_no, "requesting form id");

        let (status, body) = self
            .fetch(
                STUDENT_DATA_CALL,
                &self.student_data_url,
                &[("scholarno", scholar_no)],
            )
            .await?;

        if status != StatusCode::OK {
            info!(scholar_no, status = status.as_u16(), "student data lookup returned no record");
            return Ok(None);
        }

        let records: Value = match serde_json::from_slice(&body) {
            Ok(records) => records,
            Err(e) => {
                debug!(scholar_no, error = %e, "student data body is not JSON");
                return Ok(None);
            }
        };

        let Some(first) = records.as_array().and_then(|records| records.first()) else {
            info!(scholar_no, "student data lookup returned an empty sequence");
            return Ok(None);
        };

        let form_id = form_id_of(first).ok_or_else(|| {
            ProxyError::upstream(None, "student data record carries no FormId")
        })?;

        info!(scholar_no, form_id = %form_id, "found form id");
        Ok(Some(form_id))
    }

    /// Second call: FormId -> result records, returned verbatim
    async fn fetch_results(&self, form_id: &str) -> ProxyResult<ResultPayload> {
        info!(form_id, "requesting results");

        let (status, body) = self
            .fetch(
                STUDENT_RESULT_CALL,
                &self.student_result_url,
                &[("FormId", form_id)],
            )
            .await?;

        if status != StatusCode::OK {
            warn!(form_id, status = status.as_u16(), "student result lookup failed");
            return Err(ProxyError::upstream(
                Some(status.as_u16()),
                format!("student result lookup returned {}", status),
            ));
        }

        serde_json::from_slice(&body).map_err(|e| {
            ProxyError::upstream(None, format!("student result body is not JSON: {}", e))
        })
    }
}

#[async_trait]
impl ResultResolver for UpstreamResolver {
    async fn resolve(&self, scholar_no: &str) -> ProxyResult<Option<ResultPayload>> {
        let outcome = match self.fetch_form_id(scholar_no).await {
            Ok(Some(form_id)) => self.fetch_results(&form_id).await.map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        metrics::record_resolution(match &outcome {
            Ok(Some(_)) => "found",
            Ok(None) => "not_found",
            Err(_) => "error",
        });

        outcome
    }
}

/// Transport failures worth another attempt
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

/// FormId as a query value; upstream sends it as a number or a string
fn form_id_of(record: &Value) -> Option<String> {
    match record.get("FormId")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}
