use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::request_id::request_id_of;
use crate::{error::ErrorReport, response::ApiResponse, AppState};

/// Re-renders error envelopes with the request id, and with the full error
/// text when the server runs in debug mode.
pub async fn render_error_envelope(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = request_id_of(req.headers());
    let mut response = next.run(req).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    let mut error = report.error;
    error.request_id = request_id;
    if state.config.env.is_debug() {
        error.details = Some(report.details);
    }

    let body = match serde_json::to_vec(&ApiResponse::<()>::failure(error)) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize error envelope");
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}
