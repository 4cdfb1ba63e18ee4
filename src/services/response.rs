//! HTTP response building helpers
//!
//! Every body is JSON. Errors are always `{"message": ...}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::error::LostFoundError;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// Build a JSON response with 201 Created status
pub fn created<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::CREATED, body)
}

/// Build an empty response with 204 No Content status
pub fn no_content() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// `{"message": ...}` with the given status
pub fn message(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "message": message }))
}

pub fn not_found(msg: &str) -> Response<Full<Bytes>> {
    message(StatusCode::NOT_FOUND, msg)
}

/// Convert a LostFoundError to an appropriate HTTP response.
///
/// Server-side failures are logged here and reported with a generic message.
pub fn error_response(error: LostFoundError) -> Response<Full<Bytes>> {
    let (status, msg) = match &error {
        LostFoundError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        LostFoundError::Json(e) => (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
        LostFoundError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        LostFoundError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        LostFoundError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        LostFoundError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        _ => {
            error!(error = %error, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
    };

    message(status, &msg)
}

/// Result type alias for handlers
pub type HandlerResult = Result<Response<Full<Bytes>>, LostFoundError>;
