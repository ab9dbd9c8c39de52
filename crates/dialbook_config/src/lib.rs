// --- File: crates/dialbook_config/src/lib.rs ---
pub mod models;

pub use models::{
    AppConfig, DateRepairPolicy, GatewayConfig, ScheduleConfig, ServerConfig, VoiceConfig,
};

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use tracing::debug;

static DOTENV_LOADED: OnceCell<()> = OnceCell::new();

/// Loads `.env` into the process environment exactly once.
/// Dependent crates call this so they do not need to care whether the
/// binary entry point already did.
pub fn ensure_dotenv_loaded() {
    DOTENV_LOADED.get_or_init(|| {
        // Missing .env is fine; env vars may be set by the deployment instead.
        let _ = dotenv::dotenv();
    });
}

/// Loads the unified application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.toml` (optional)
/// 2. `config/{RUN_ENV}.toml` (optional, RUN_ENV defaults to "development")
/// 3. Environment variables with prefix `DIALBOOK__` and `__` separators,
///    e.g. `DIALBOOK__SERVER__PORT=8080`.
///
/// Secrets (provider API keys) are never part of this struct; they are read
/// straight from the environment by the service factory.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());
    debug!("Loading configuration for RUN_ENV={}", run_env);

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("DIALBOOK").separator("__"))
        .build()?
        .try_deserialize()
}
