mod active;
mod health;
mod manifest;
mod metrics;
mod start;
mod stop;
mod usage;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/relay/start", post(start::start_relay))
        .route("/api/v1/relay/active", get(active::get_active))
        .route("/api/v1/relay/stop", post(stop::stop_relay))
        .route("/api/v1/relay/manifest", get(manifest::get_manifest))
        .route("/api/v1/usage/current", get(usage::get_usage_current))
        .route("/api/v1/relay/health", post(health::post_relay_health))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(metrics::render_metrics))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
