/// Result lookup endpoint
/// GET /api/getResult?scholarNo=<id>&forceRefresh=<bool?>
use crate::{
    error::{ProxyError, ProxyResult},
    metrics,
    results::ResultPayload,
    AppContext,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResultParams {
    /// Scholar number to look up (e.g., "211113004")
    pub scholar_no: Option<String>,
    /// Skip the cache and re-resolve from upstream
    pub force_refresh: Option<String>,
}

impl GetResultParams {
    /// Trimmed scholar number; blank counts as missing
    pub fn scholar_no(&self) -> Option<&str> {
        self.scholar_no
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn force_refresh(&self) -> bool {
        is_truthy(self.force_refresh.as_deref())
    }
}

/// Any non-empty value other than false/0/no enables the flag
fn is_truthy(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) => !matches!(v.as_str(), "" | "false" | "0" | "no"),
    }
}

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/getResult", get(get_result))
}

pub async fn get_result(
    State(ctx): State<AppContext>,
    query: Result<Query<GetResultParams>, QueryRejection>,
) -> ProxyResult<Response> {
    let Query(params) = query?;

    let scholar_no = params
        .scholar_no()
        .ok_or_else(|| ProxyError::BadInput("Scholar number is required".to_string()))?;

    if !params.force_refresh() {
        let cached = ctx.cache.lookup(scholar_no).await;
        metrics::record_cache_access(cached.is_some());

        if let Some(hit) = cached {
            debug!(scholar_no, remaining_secs = hit.remaining.as_secs(), "result cache hit");
            return Ok(cached_response(hit.payload, hit.remaining));
        }
        debug!(scholar_no, "result cache miss");
    } else {
        debug!(scholar_no, "forced refresh, bypassing result cache");
    }

    let payload = ctx
        .resolver
        .resolve(scholar_no)
        .await?
        .ok_or_else(|| ProxyError::NotFound {
            scholar_no: scholar_no.to_string(),
        })?;

    ctx.cache.put(scholar_no, payload.clone()).await;

    Ok(cached_response(payload, ctx.cache.ttl()))
}

/// JSON body with a `Cache-Control` header advertising `max_age`
fn cached_response(payload: ResultPayload, max_age: Duration) -> Response {
    let directive = format!("public, max-age={}", max_age.as_secs());
    let mut response = Json(payload).into_response();
    if let Ok(value) = HeaderValue::from_str(&directive) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
