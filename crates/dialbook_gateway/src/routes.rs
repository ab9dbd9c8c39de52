// --- File: crates/dialbook_gateway/src/routes.rs ---
//! Router construction. Every path funnels into the one gateway handler;
//! the handler resolves the action from path, query, and body itself.

use axum::routing::any;
use axum::Router;

use crate::handlers::{gateway_handler, GatewayState};

pub fn routes(state: GatewayState) -> Router {
    Router::new()
        .route("/", any(gateway_handler))
        .route("/{*path}", any(gateway_handler))
        .with_state(state)
}
