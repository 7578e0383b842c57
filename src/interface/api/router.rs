//! API Router configuration

use super::calls_handler::{
    cancel_dispatch, confirm_dispatch, create_sip_call, create_web_call, dispatch_agent,
    end_call, get_call_status, list_active_calls, list_dispatches, update_call_metadata,
};
use super::campaign_handler::{
    campaign_analytics, cancel_campaign, complete_campaign, create_campaign, delete_campaign,
    get_campaign, list_campaigns, pause_campaign, record_outcome, resume_campaign,
    start_campaign, update_call_config, update_campaign,
};
use super::metrics_handler::metrics_handler;
use super::AppState;
use axum::{
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "vocalis",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the API router
pub fn build_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    // Health check route (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // Call session routes
    let call_routes = Router::new()
        .route("/calls/web", post(create_web_call))
        .route("/calls/sip", post(create_sip_call))
        .route("/calls/active", get(list_active_calls))
        .route("/calls/agent-dispatch", post(dispatch_agent))
        .route("/calls/dispatches/:dispatch_id", delete(cancel_dispatch))
        .route(
            "/calls/dispatches/:dispatch_id/confirm",
            post(confirm_dispatch),
        )
        .route("/calls/:session_name/status", get(get_call_status))
        .route("/calls/:session_name/dispatches", get(list_dispatches))
        .route("/calls/:session_name/metadata", patch(update_call_metadata))
        .route("/calls/:session_name", delete(end_call));

    // Campaign routes
    let campaign_routes = Router::new()
        .route("/campaigns", post(create_campaign))
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id", put(update_campaign))
        .route("/campaigns/:id", delete(delete_campaign))
        .route("/campaigns/:id/call-config", put(update_call_config))
        .route("/campaigns/:id/start", post(start_campaign))
        .route("/campaigns/:id/pause", post(pause_campaign))
        .route("/campaigns/:id/resume", post(resume_campaign))
        .route("/campaigns/:id/complete", post(complete_campaign))
        .route("/campaigns/:id/cancel", post(cancel_campaign))
        .route("/campaigns/:id/outcomes", post(record_outcome))
        .route("/campaigns/:id/analytics", get(campaign_analytics));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(health_routes)
        .merge(call_routes)
        .merge(campaign_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
