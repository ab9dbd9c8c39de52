// --- File: crates/dialbook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Scheduling Provider Config ---
// Holds non-secret scheduling config. API key loaded directly from env var:
// SCHEDULE_API_KEY (overridable per request by callers that supply their own).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    pub base_url: String, // e.g. https://api.scheduler.example/v1
    pub event_type_id: Option<String>, // default event type used when the caller supplies none
    pub time_zone: Option<String>, // IANA name, e.g. "Europe/Zurich"
    pub language: Option<String>,  // booking language hint, e.g. "en"
}

// --- Voice Platform Config ---
// Holds non-secret voice platform config. API key loaded directly from env var:
// VOICE_API_KEY
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoiceConfig {
    pub base_url: String, // e.g. https://api.voice.example
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<String>,
    pub sip_trunk_id: Option<String>, // used for the SIP-first outbound call path
}

/// How the booking pipeline treats a requested start time that lies in the past.
///
/// `ShiftForward` silently repairs the date (past year -> current year,
/// earlier today -> tomorrow at the same hour/minute) and reports the
/// adjustment in the response. `Reject` fails validation instead.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateRepairPolicy {
    #[default]
    ShiftForward,
    Reject,
}

// --- Gateway (core pipeline) Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    /// Maximum number of alternative slots offered on a booking conflict.
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    /// Days before/after the requested date queried for the pre-flight check.
    #[serde(default = "default_availability_window_days")]
    pub availability_window_days: i64,
    /// Widened window used when computing alternatives after a conflict.
    #[serde(default = "default_conflict_window_before_days")]
    pub conflict_window_before_days: i64,
    #[serde(default = "default_conflict_window_after_days")]
    pub conflict_window_after_days: i64,
    #[serde(default)]
    pub date_repair: DateRepairPolicy,
}

fn default_max_alternatives() -> usize {
    5
}
fn default_availability_window_days() -> i64 {
    1
}
fn default_conflict_window_before_days() -> i64 {
    3
}
fn default_conflict_window_after_days() -> i64 {
    7
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            max_alternatives: default_max_alternatives(),
            availability_window_days: default_availability_window_days(),
            conflict_window_before_days: default_conflict_window_before_days(),
            conflict_window_after_days: default_conflict_window_after_days(),
            date_repair: DateRepairPolicy::default(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_schedule: bool,
    #[serde(default)]
    pub use_voice: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
    #[serde(default)]
    pub voice: Option<VoiceConfig>,
    #[serde(default)]
    pub gateway: GatewayConfig,
}
