use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by broadcasting the new settings snapshot to every
/// connected stream.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::SettingsChanged { settings } => {
                debug!(
                    "Handling SettingsChanged event for {} SSE connection(s)",
                    self.sse_manager.subscriber_count()
                );
                self.sse_manager.publish(settings.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use events::EventPublisher;
    use serde_json::json;

    #[tokio::test]
    async fn settings_changed_reaches_subscribers() {
        let manager = Arc::new(Manager::default());
        let mut subscriber = manager.subscribe();
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&manager))));

        publisher
            .publish(DomainEvent::SettingsChanged {
                settings: json!({"timer_disabled": true}),
            })
            .await;

        assert_eq!(
            *subscriber.recv().await.unwrap(),
            Message::Settings {
                settings: json!({"timer_disabled": true})
            }
        );
    }
}
