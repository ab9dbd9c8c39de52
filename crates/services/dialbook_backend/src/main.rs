// File: services/dialbook_backend/src/main.rs
use dialbook_common::logging;
use dialbook_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod app_state;
mod service_factory;

use app_state::AppState;
use service_factory::DialbookServiceFactory;

#[tokio::main]
async fn main() {
    dialbook_config::ensure_dotenv_loaded();
    logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));
    let factory = Arc::new(DialbookServiceFactory::new(&config));
    let state = AppState::new(config.clone(), factory);

    let app = dialbook_gateway::routes(state.gateway_state());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    info!("Starting Dialbook gateway at http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
