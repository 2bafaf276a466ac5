/// Health check and metrics endpoints
///
/// Two kinds of health check:
/// - Liveness: Is the application alive? (restart if not)
/// - Detailed: uptime and result cache size for monitoring

use crate::{context::AppContext, metrics};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status
    pub status: String,

    /// Application version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: f64,

    /// Stored result cache entries, expired included
    pub cache_entries: usize,

    /// Cache TTL in seconds
    pub cache_ttl_seconds: u64,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_check))
        .route("/health/detailed", get(health_detailed))
        .route("/metrics", get(metrics_endpoint))
}

/// Basic health check
///
/// Returns simple JSON with status and version
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness check
///
/// If we can respond, we're alive
pub async fn liveness_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Detailed health check
pub async fn health_detailed(State(ctx): State<AppContext>) -> Json<HealthStatus> {
    let uptime = ctx.uptime_seconds();
    metrics::UPTIME_SECONDS.set(uptime);

    let health = HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        cache_entries: ctx.cache.len().await,
        cache_ttl_seconds: ctx.cache.ttl().as_secs(),
    };

    tracing::debug!(
        cache_entries = health.cache_entries,
        "health_check_completed"
    );

    Json(health)
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint(State(ctx): State<AppContext>) -> impl IntoResponse {
    metrics::UPTIME_SECONDS.set(ctx.uptime_seconds());

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}
