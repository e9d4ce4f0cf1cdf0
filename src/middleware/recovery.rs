use axum::response::{IntoResponse, Response};
use std::any::Any;

use crate::error::AppError;

/// Turns a handler panic into the standard internal-error envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {message}")).into_response()
}
