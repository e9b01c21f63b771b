use crate::{AppState, Error};
use ::sse::session::StreamSession;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use domain::settings as SettingsApi;
use futures::Stream;
use log::*;
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

/// GET a long-lived stream of settings snapshots: one `init` message with the
/// current document, then a `settings` message after every change.
#[utoipa::path(
    get,
    path = "/settings/stream",
    responses(
        (status = 200, description = "`text/event-stream` of `{type, settings}` messages"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Settings store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    // Subscribe before reading the snapshot so no change in between is lost
    let session = StreamSession::connect(Arc::clone(&app_state.sse_manager));
    debug!("Establishing SSE connection {}", session.id().as_str());

    let settings = SettingsApi::find(app_state.settings_store()).await?;
    let snapshot = serde_json::to_value(&settings).unwrap_or_else(|e| {
        error!("Failed to encode the init snapshot: {e}");
        Value::Object(Map::new())
    });

    let keep_alive = KeepAlive::new().interval(Duration::from_secs(
        app_state.config.sse_keep_alive_secs.max(1),
    ));

    Ok(Sse::new(session.into_event_stream(snapshot)).keep_alive(keep_alive))
}
