// --- File: crates/dialbook_gateway/src/lib.rs ---
// Declare modules within this crate
pub mod booking;
pub mod dispatch;
pub mod handlers;
pub mod respond;
pub mod routes;
pub mod webhook;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod booking_test;
#[cfg(test)]
mod webhook_test;

pub use dispatch::{ActionKind, ActionRequest, InboundRequest};
pub use handlers::GatewayState;
pub use routes::routes;
