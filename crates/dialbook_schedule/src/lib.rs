// --- File: crates/dialbook_schedule/src/lib.rs ---
// Declare modules within this crate
pub mod error;
pub mod models;
pub mod service;
#[cfg(test)]
mod service_test;

pub use error::{is_conflict_message, ScheduleError};
pub use service::ScheduleClient;
