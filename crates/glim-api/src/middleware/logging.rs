//! Access log for the REST API.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info, warn};

/// Probe paths logged at debug so they don't flood the access log.
const PROBES: &[&str] = &["/v1/healthz", "/v1/readyz"];

/// Logs method, path, status and latency of every request. Server errors
/// are logged at warn.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        warn!(%method, %path, status, latency_ms, "HTTP request failed");
    } else if PROBES.contains(&path.as_str()) {
        debug!(%method, %path, status, latency_ms, "HTTP probe");
    } else {
        info!(%method, %path, status, latency_ms, "HTTP request");
    }

    response
}
