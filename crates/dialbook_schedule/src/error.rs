// --- File: crates/dialbook_schedule/src/error.rs ---
use dialbook_common::services::{ServiceError, ServiceErrorKind};
use thiserror::Error;

/// Scheduling-provider specific error types.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Error occurred during a provider API request
    #[error("Scheduling API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the provider API
    #[error("Scheduling API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing a provider API response
    #[error("Failed to parse scheduling API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete scheduling configuration
    #[error("Scheduling configuration missing or incomplete: {0}")]
    ConfigError(String),
}

/// Substrings the provider uses in error messages when the requested time
/// is already taken. Matching is case-insensitive.
const CONFLICT_INDICATORS: [&str; 4] = [
    "already booked",
    "already has booking",
    "no_available_users_found",
    "no available users",
];

/// Whether a provider error message describes a booking conflict.
pub fn is_conflict_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONFLICT_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
}

impl From<ScheduleError> for ServiceError {
    fn from(err: ScheduleError) -> Self {
        let (kind, status, message) = match &err {
            ScheduleError::ApiError {
                status_code,
                message,
            } => {
                let kind = if is_conflict_message(message) {
                    ServiceErrorKind::Conflict
                } else {
                    match status_code {
                        401 | 403 => ServiceErrorKind::Auth,
                        404 => ServiceErrorKind::NotFound,
                        _ => ServiceErrorKind::Upstream,
                    }
                };
                (kind, Some(*status_code), message.clone())
            }
            other => (ServiceErrorKind::Upstream, None, other.to_string()),
        };
        ServiceError {
            service: "scheduler",
            kind,
            status,
            message,
        }
    }
}
