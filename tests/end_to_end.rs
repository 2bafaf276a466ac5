/// End-to-end tests: router + UpstreamResolver against a mocked college API
///
/// Uses wiremock for the upstream. Covers the two-step lookup, not-found and
/// upstream error mapping, retry after a timeout, and cache reuse.
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use scholar_results_proxy::{
    config::{CacheConfig, LoggingConfig, RetryConfig, ServerConfig, ServiceConfig, UpstreamConfig},
    results::{RetryPolicy, UpstreamResolver},
    server::build_router,
    AppContext,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATA_PATH: &str = "/api/StudentActivity/GetStudentData";
const RESULT_PATH: &str = "/api/StudentActivity/GetStudentResult";

fn create_test_app(mock_server: &MockServer) -> Router {
    let config = ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
        },
        upstream: UpstreamConfig {
            base_url: mock_server.uri(),
            ..UpstreamConfig::default()
        },
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 10,
        },
        cache: CacheConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
    };

    let resolver = UpstreamResolver::new(&config.upstream, RetryPolicy::from_config(&config.retry))
        .expect("failed to create resolver")
        .with_timeout(Duration::from_millis(300));

    build_router(AppContext::with_resolver(config, Arc::new(resolver)))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, cache_control, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_lookup_returns_upstream_records_verbatim() {
    let mock_server = MockServer::start().await;
    let records = json!([
        {"StudentName": "A Student", "Semester": "I", "SGPA": 8.5, "ExamPeriod": "Dec 2023"},
        {"StudentName": "A Student", "Semester": "II", "SGPA": 8.9, "ExamPeriod": "May 2024"}
    ]);

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .and(query_param("scholarno", "211113004"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"FormId": 555}])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .and(query_param("FormId", "555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, cache_control, body) = get(&app, "/api/getResult?scholarNo=211113004").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, records);
    assert!(cache_control.unwrap().contains("max-age=21600"));

    // Served from cache; the `expect(1)` counts above verify no second upstream round
    let (status, _, body) = get(&app, "/api/getResult?scholarNo=211113004").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, records);
}

#[tokio::test]
async fn test_empty_student_data_is_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, _, body) = get(&app, "/api/getResult?scholarNo=12345").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "No results found for scholar number 12345"})
    );
}

#[tokio::test]
async fn test_non_200_student_data_is_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, _, body) = get(&app, "/api/getResult?scholarNo=12345").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "No results found for scholar number 12345"})
    );
}

#[tokio::test]
async fn test_result_call_failure_forwards_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"FormId": 77}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .and(query_param("FormId", "77"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, cache_control, body) = get(&app, "/api/getResult?scholarNo=12345").await;

    assert!(!status.is_success());
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Upstream error"}));
    assert!(cache_control.is_none());
}

#[tokio::test]
async fn test_timeout_then_success_matches_direct_success() {
    let mock_server = MockServer::start().await;
    let records = json!([{"Semester": "IV", "SGPA": 7.9}]);

    // First attempt of the first call outlives the client timeout
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"FormId": 555}]))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .and(query_param("scholarno", "211113004"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"FormId": 555}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .and(query_param("FormId", "555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records.clone()))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, cache_control, body) = get(&app, "/api/getResult?scholarNo=211113004").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, records);
    assert_eq!(cache_control.as_deref(), Some("public, max-age=21600"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let (status, _, body) = get(&app, "/api/getResult?scholarNo=12345").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "Upstream error"}));
}
