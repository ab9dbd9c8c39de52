// --- File: crates/dialbook_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    conflict, external_service_error, internal_error, not_found, validation_error, GatewayError,
    HttpStatusCode,
};

// Re-export HTTP utilities for easier access
pub use http::{
    client::HTTP_CLIENT, preflight_handler, with_cors, IntoHttpResponse, CORS_HEADERS,
};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level};
