use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;

use super::request_id::request_id_of;

/// Wraps each request in a span carrying its request id and logs the outcome
/// once the response is ready.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = request_id_of(req.headers()).unwrap_or_default();

    let span = tracing::info_span!("request", %method, %path, %request_id);

    async move {
        tracing::debug!("Request started");

        let response = next.run(req).await;

        let status = response.status().as_u16();
        let latency_ms = start.elapsed().as_millis() as u64;

        if status >= 500 {
            tracing::error!(status, latency_ms, "Request failed");
        } else if status >= 400 {
            tracing::warn!(status, latency_ms, "Request rejected");
        } else {
            tracing::info!(status, latency_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}
