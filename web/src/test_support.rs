use crate::AppState;
use ::sse::domain_event_handler::SseDomainEventHandler;
use ::sse::Manager;
use clap::Parser;
use domain::{MemoryBackend, SettingsStore};
use events::EventPublisher;
use service::config::Config;
use std::sync::Arc;

/// Memory-backed state wired the same way `main` wires it.
pub(crate) fn app_state(admin_api_token: Option<&str>) -> AppState {
    let config = Config::try_parse_from([
        "settings_hub",
        "--storage-backend",
        "memory",
        "--allowed-origins",
        "*",
    ])
    .unwrap()
    .set_admin_api_token(admin_api_token.map(str::to_string));

    app_state_with(config)
}

pub(crate) fn app_state_with(config: Config) -> AppState {
    let settings_store = Arc::new(SettingsStore::new(Arc::new(MemoryBackend::new())));
    let sse_manager = Arc::new(Manager::new(config.subscriber_queue_capacity));
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&sse_manager))));

    AppState::new(config, settings_store, sse_manager, event_publisher)
}
