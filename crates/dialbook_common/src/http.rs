// --- File: crates/dialbook_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{GatewayError, HttpStatusCode};

// Include the client module
pub mod client;

/// CORS headers attached to every response, error paths included. The web
/// front end calls the gateway cross-origin and the voice platform tolerates
/// the extra headers.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
];

/// Injects the CORS headers into an already-built response.
pub fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::from_bytes(name.as_bytes()),
            axum::http::HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    response
}

/// Handler for OPTIONS requests to support CORS preflight.
pub async fn preflight_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
            ("Access-Control-Max-Age", "86400"),
        ],
    )
}

/// Extension trait for GatewayError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for GatewayError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "type": self.error_type(),
        });
        match &self {
            GatewayError::Validation { field } => {
                body["field"] = json!(field);
            }
            GatewayError::NotFound { resource } => {
                body["resource"] = json!(resource);
            }
            _ => {}
        }

        with_cors((status_code, Json(body)).into_response())
    }
}

/// Implement IntoResponse for GatewayError to make it easier to use in Axum handlers.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
