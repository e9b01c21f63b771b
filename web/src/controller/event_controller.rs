use crate::controller::json_body;
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::{settings as SettingsApi, EventConfig};

use log::*;

/// GET the overrides for one event type
#[utoipa::path(
    get,
    path = "/settings/events/{event_type}",
    params(
        ("event_type" = String, Path, description = "Event type name, e.g. `overtime`")
    ),
    responses(
        (status = 200, description = "The event type's config, or `{}` when none is stored", body = EventConfig),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Settings store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(event_type): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET event config for: {event_type}");

    let config = SettingsApi::find_event(app_state.settings_store(), &event_type).await?;

    Ok(Json(config))
}

/// PUT merge known fields into one event type's overrides. Unknown fields are ignored.
#[utoipa::path(
    put,
    path = "/settings/events/{event_type}",
    params(
        ("event_type" = String, Path, description = "Event type name, e.g. `overtime`")
    ),
    request_body = EventConfig,
    responses(
        (status = 200, description = "Successfully merged; returns the event type's resulting config", body = EventConfig),
        (status = 400, description = "Body is not a JSON object"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Settings store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(event_type): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let body = json_body(&body)?;
    debug!("PUT event config for {event_type} with: {body}");

    let config = SettingsApi::update_event(
        app_state.settings_store(),
        &app_state.event_publisher,
        &event_type,
        body,
    )
    .await?;

    Ok(Json(config))
}
