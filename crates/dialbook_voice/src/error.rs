// --- File: crates/dialbook_voice/src/error.rs ---
use dialbook_common::services::{ServiceError, ServiceErrorKind};
use thiserror::Error;

/// Voice-platform specific error types.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// Error occurred during a platform API request
    #[error("Voice API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the platform API
    #[error("Voice API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing a platform API response
    #[error("Failed to parse voice API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete voice configuration
    #[error("Voice configuration missing or incomplete: {0}")]
    ConfigError(String),
}

impl From<VoiceError> for ServiceError {
    fn from(err: VoiceError) -> Self {
        let (kind, status, message) = match &err {
            VoiceError::ApiError {
                status_code,
                message,
            } => {
                let kind = match status_code {
                    401 | 403 => ServiceErrorKind::Auth,
                    404 => ServiceErrorKind::NotFound,
                    _ => ServiceErrorKind::Upstream,
                };
                (kind, Some(*status_code), message.clone())
            }
            other => (ServiceErrorKind::Upstream, None, other.to_string()),
        };
        ServiceError {
            service: "voice",
            kind,
            status,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_404_classifies_as_not_found() {
        let err = VoiceError::ApiError {
            status_code: 404,
            message: "call not found".into(),
        };
        let svc: ServiceError = err.into();
        assert_eq!(svc.kind, ServiceErrorKind::NotFound);
    }
}
