// --- File: crates/services/dialbook_backend/src/app_state.rs ---
use dialbook_common::services::ServiceFactory;
use dialbook_config::AppConfig;
use dialbook_gateway::GatewayState;
use std::sync::Arc;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service_factory: Arc<dyn ServiceFactory>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, service_factory: Arc<dyn ServiceFactory>) -> Self {
        AppState {
            config,
            service_factory,
        }
    }

    /// Snapshot of the providers the gateway router needs.
    pub fn gateway_state(&self) -> GatewayState {
        GatewayState {
            config: self.config.clone(),
            scheduling: self.service_factory.scheduling_service(),
            voice: self.service_factory.voice_service(),
        }
    }
}
