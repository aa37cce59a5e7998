//! HTTP handler for scrape clients.
//!
//! # Responsibilities
//! - Create the Axum Router serving the metrics path, landing page and `/health`
//! - Gate the metrics path behind basic auth when configured
//! - Wire up middleware (request ID, tracing)
//! - Count scrapes in the exporter's own registry

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::exporter::BasicAuth;
use crate::http::auth::basic_auth_middleware;
use crate::http::request::{request_id_header, UuidRequestId, X_REQUEST_ID};
use crate::observability::MetricsRegistry;

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ScrapeState {
    registry: Arc<MetricsRegistry>,
    scrapes_total: Arc<str>,
    metrics_path: Arc<str>,
}

impl ScrapeState {
    pub fn new(registry: Arc<MetricsRegistry>, namespace: &str, metrics_path: &str) -> Self {
        let scrapes_total = format!("{namespace}_exporter_scrapes_total");
        registry.record(|| {
            metrics::describe_counter!(scrapes_total.clone(), "Current total redis scrapes.");
        });
        Self {
            registry,
            scrapes_total: scrapes_total.into(),
            metrics_path: metrics_path.into(),
        }
    }
}

/// Build the router with all middleware layers.
pub fn build_router(state: ScrapeState, basic_auth: Option<BasicAuth>) -> Router {
    let metrics_path = state.metrics_path.to_string();

    let mut metrics_route = get(metrics_handler);
    if let Some(auth) = basic_auth {
        metrics_route = metrics_route.layer(middleware::from_fn_with_state(
            Arc::new(auth),
            basic_auth_middleware,
        ));
    }

    // Any validated path is a literal route, including `:` and `*` segments.
    let mut router = Router::new()
        .without_v07_checks()
        .route(&metrics_path, metrics_route);
    if metrics_path != "/" {
        router = router.route("/", get(index_handler));
    }
    if metrics_path != "/health" {
        router = router.route("/health", get(health_handler));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::debug_span!(
                        "scrape",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(request_id_header())),
    )
}

async fn metrics_handler(State(state): State<ScrapeState>) -> impl IntoResponse {
    let name = state.scrapes_total.to_string();
    state
        .registry
        .record(|| metrics::counter!(name).increment(1));

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.registry.render(),
    )
}

async fn index_handler(State(state): State<ScrapeState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Redis Exporter {version}</title></head>\n<body>\n\
         <h1>Redis Exporter {version}</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n</body>\n</html>\n",
        version = env!("CARGO_PKG_VERSION"),
        path = state.metrics_path,
    ))
}

async fn health_handler() -> &'static str {
    "ok"
}
