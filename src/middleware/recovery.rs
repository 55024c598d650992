//! Panic recovery for handlers

use axum::response::{IntoResponse, Response};
use std::any::Any;

use crate::error::ApiError;

/// Turn a handler panic into a JSON 500 instead of dropping the connection.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::InternalError(format!("handler panicked: {}", detail)).into_response()
}
