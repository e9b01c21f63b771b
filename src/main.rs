use events::EventPublisher;
use log::*;
use service::{config::Config, logging::Logger, AppState};
use sse::domain_event_handler::SseDomainEventHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start the logger: {e}");
    }

    info!(
        "Starting settings hub ({} environment, {} storage)",
        config.runtime_env(),
        config.storage_backend
    );
    if config.admin_api_token().is_none() {
        warn!("ADMIN_API_TOKEN is not set; settings endpoints are open to anyone");
    }

    let settings_store = match service::init_store(&config).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open the settings store: {e}");
            std::process::exit(1);
        }
    };

    let sse_manager = Arc::new(sse::Manager::new(config.subscriber_queue_capacity));
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&sse_manager))));

    let app_state = AppState::new(config, settings_store, sse_manager, event_publisher);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }

    info!("Server shut down");
}
