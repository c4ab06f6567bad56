//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): requests by route and outcome
//! - `pipeline_request_duration_seconds` (histogram): time from binding to response
//! - `pipeline_stage_failures_total` (counter): failures by route and phase
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are route name and pipeline state only (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::pipeline::PipelineState;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(route: &str, outcome: PipelineState, start: Instant) {
    let route = route.to_string();
    metrics::counter!(
        "pipeline_requests_total",
        "route" => route.clone(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!("pipeline_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record the phase a failed request stopped in.
pub fn record_stage_failure(route: &str, phase: PipelineState) {
    metrics::counter!(
        "pipeline_stage_failures_total",
        "route" => route.to_string(),
        "phase" => phase.as_str()
    )
    .increment(1);
}
