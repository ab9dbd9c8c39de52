// --- File: crates/dialbook_voice/src/lib.rs ---
// Declare modules within this crate
pub mod error;
pub mod service;

pub use error::VoiceError;
pub use service::VoiceClient;
