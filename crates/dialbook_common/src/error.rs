// --- File: crates/dialbook_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for the Dialbook gateway.
///
/// Every error leaving the system is one of these variants; the outermost
/// handler converts them into structured JSON envelopes so nothing escapes
/// as an unhandled fault.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing or malformed input field; carries the offending field name.
    #[error("Missing or invalid field: {field}")]
    Validation { field: String },

    /// Missing upstream resource; carries the resource name.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Upstream rejected credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Requested time is unavailable. Alternatives travel in the booking
    /// outcome, not inside the error.
    #[error("Booking conflict: {0}")]
    Conflict(String),

    /// Error from an external provider call.
    #[error("External service error: {service} - {message}")]
    ExternalService {
        service: String,
        message: String,
        status: Option<u16>,
    },

    /// Catch-all for unclassified failures.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable discriminant used in JSON error envelopes.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "validation_error",
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::Auth(_) => "auth_error",
            GatewayError::Conflict(_) => "conflict",
            GatewayError::ExternalService { .. } => "external_service_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for GatewayError {
    fn status_code(&self) -> u16 {
        match self {
            GatewayError::Validation { .. } => 400,
            GatewayError::NotFound { .. } => 404,
            GatewayError::Auth(_) => 401,
            GatewayError::Conflict(_) => 409,
            // Provider failures keep the upstream status when one is known.
            GatewayError::ExternalService { status, .. } => status.unwrap_or(500),
            GatewayError::Internal(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Internal(err.to_string())
    }
}

// Utility constructors
pub fn validation_error<T: fmt::Display>(field: T) -> GatewayError {
    GatewayError::Validation {
        field: field.to_string(),
    }
}

pub fn not_found<T: fmt::Display>(resource: T) -> GatewayError {
    GatewayError::NotFound {
        resource: resource.to_string(),
    }
}

pub fn conflict<T: fmt::Display>(message: T) -> GatewayError {
    GatewayError::Conflict(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(
    service: &str,
    message: T,
    status: Option<u16>,
) -> GatewayError {
    GatewayError::ExternalService {
        service: service.to_string(),
        message: message.to_string(),
        status,
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> GatewayError {
    GatewayError::Internal(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(validation_error("action").status_code(), 400);
        assert_eq!(not_found("booking").status_code(), 404);
        assert_eq!(GatewayError::Auth("bad key".into()).status_code(), 401);
        assert_eq!(conflict("slot taken").status_code(), 409);
        assert_eq!(internal_error("boom").status_code(), 500);
    }

    #[test]
    fn external_service_status_defaults_to_500() {
        assert_eq!(external_service_error("scheduler", "down", None).status_code(), 500);
        assert_eq!(
            external_service_error("scheduler", "teapot", Some(418)).status_code(),
            418
        );
    }

    #[test]
    fn validation_error_names_field() {
        let err = validation_error("startTime");
        assert!(err.to_string().contains("startTime"));
        assert_eq!(err.error_type(), "validation_error");
    }
}
