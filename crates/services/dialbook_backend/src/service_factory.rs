// --- File: crates/services/dialbook_backend/src/service_factory.rs ---
//! Wires concrete provider clients according to runtime configuration.
//!
//! Providers are instantiated once at startup. A provider is enabled only
//! when its `use_*` flag is set, its config section exists, and its API key
//! is present in the environment; anything missing downgrades the provider
//! to "not configured" with a logged warning instead of failing startup.

use dialbook_common::services::{SchedulingService, ServiceFactory, VoiceService};
use dialbook_config::AppConfig;
use dialbook_schedule::ScheduleClient;
use dialbook_voice::VoiceClient;
use std::sync::Arc;
use tracing::{info, warn};

const SCHEDULE_API_KEY_VAR: &str = "SCHEDULE_API_KEY";
const VOICE_API_KEY_VAR: &str = "VOICE_API_KEY";

pub struct DialbookServiceFactory {
    scheduling: Option<Arc<dyn SchedulingService>>,
    voice: Option<Arc<dyn VoiceService>>,
}

impl DialbookServiceFactory {
    pub fn new(config: &AppConfig) -> Self {
        let scheduling: Option<Arc<dyn SchedulingService>> = if config.use_schedule {
            match (config.schedule.as_ref(), std::env::var(SCHEDULE_API_KEY_VAR)) {
                (Some(schedule), Ok(api_key)) => {
                    info!("Scheduling provider enabled ({})", schedule.base_url);
                    Some(Arc::new(ScheduleClient::new(schedule, api_key)))
                }
                (None, _) => {
                    warn!("use_schedule is set but the [schedule] config section is missing");
                    None
                }
                (_, Err(_)) => {
                    warn!("use_schedule is set but {} is not set", SCHEDULE_API_KEY_VAR);
                    None
                }
            }
        } else {
            None
        };

        let voice: Option<Arc<dyn VoiceService>> = if config.use_voice {
            match (config.voice.as_ref(), std::env::var(VOICE_API_KEY_VAR)) {
                (Some(voice), Ok(api_key)) => {
                    info!("Voice platform enabled ({})", voice.base_url);
                    Some(Arc::new(VoiceClient::new(voice, api_key)))
                }
                (None, _) => {
                    warn!("use_voice is set but the [voice] config section is missing");
                    None
                }
                (_, Err(_)) => {
                    warn!("use_voice is set but {} is not set", VOICE_API_KEY_VAR);
                    None
                }
            }
        } else {
            None
        };

        DialbookServiceFactory { scheduling, voice }
    }
}

impl ServiceFactory for DialbookServiceFactory {
    fn scheduling_service(&self) -> Option<Arc<dyn SchedulingService>> {
        self.scheduling.clone()
    }

    fn voice_service(&self) -> Option<Arc<dyn VoiceService>> {
        self.voice.clone()
    }
}
