//! Shared harness for API integration tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use dialbatch_api::allocator::{
    AllocationRequest, AllocationResult, DialcodeAllocator, ShortfallPolicy,
};
use dialbatch_api::config::{ServerConfig, StorageSettings};
use dialbatch_api::routes;
use dialbatch_api::state::AppState;
use dialbatch_core::error::CoreError;
use dialbatch_pipeline::DispatchHandle;

/// Test allocator that mints sequential codes locally.
pub struct StaticAllocator;

#[async_trait]
impl DialcodeAllocator for StaticAllocator {
    async fn allocate(
        &self,
        count: u32,
        _request: &AllocationRequest,
    ) -> Result<AllocationResult, CoreError> {
        Ok(AllocationResult {
            dialcodes: (0..count).map(|i| format!("T{i:04}")).collect(),
            count,
        })
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        sweep_interval_secs: 24 * 60 * 60,
        sweep_scan_limit: 100,
        work_dir: std::env::temp_dir().join("dialbatch-tests"),
        font_path: None,
        storage: StorageSettings::Local {
            root: PathBuf::from("./blobs"),
            base_url: "http://localhost:3000/blobs".to_string(),
        },
        allocator_url: "http://localhost:9090/dialcodes".to_string(),
        allocator_per_call_max: 1000,
        shortfall_policy: ShortfallPolicy::Absorb,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. No dispatcher runs; the returned
/// receiver exposes what the handlers submitted.
pub fn build_test_app(pool: PgPool) -> (Router, mpsc::UnboundedReceiver<String>) {
    let config = test_config();
    let (dispatch, rx) = DispatchHandle::channel();

    let state = AppState {
        pool,
        config: Arc::new(config),
        dispatch,
        allocator: Arc::new(StaticAllocator),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    (app, rx)
}

/// Send a GET request to the app and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and return the raw response.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
