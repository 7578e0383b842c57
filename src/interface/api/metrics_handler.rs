//! Prometheus metrics handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");

    // Describe metrics
    describe_counter!(
        "calls_created_total",
        "Total number of call sessions created"
    );
    describe_counter!(
        "calls_ended_total",
        "Total number of call sessions terminated via the API"
    );
    describe_counter!(
        "agent_dispatches_total",
        "Total number of agent dispatch requests"
    );
    describe_counter!(
        "campaign_dial_outcomes_total",
        "Total number of campaign dial outcomes recorded"
    );
    describe_gauge!(
        "active_call_sessions",
        "Number of currently active call sessions"
    );

    handle
}

/// HTTP metrics handler
pub async fn metrics_handler(
    axum::extract::State(prometheus_handle): axum::extract::State<PrometheusHandle>,
) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}

/// Update the active sessions gauge
pub fn update_active_sessions(count: usize) {
    gauge!("active_call_sessions").set(count as f64);
}
