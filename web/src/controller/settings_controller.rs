use crate::controller::json_body;
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::{settings as SettingsApi, Settings};
use serde_json::json;

use log::*;

/// GET the whole settings document
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Successfully retrieved the settings document", body = Settings),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Settings store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET settings document");

    let settings = SettingsApi::find(app_state.settings_store()).await?;

    Ok(Json(settings))
}

/// PUT merge a partial document into the settings document
#[utoipa::path(
    put,
    path = "/settings",
    request_body = Settings,
    responses(
        (status = 200, description = "Successfully merged; returns the resulting document", body = Settings),
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
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let body = json_body(&body)?;
    debug!("PUT settings with: {body}");

    let settings = SettingsApi::update(
        app_state.settings_store(),
        &app_state.event_publisher,
        body,
    )
    .await?;

    debug!("Updated settings: {settings:?}");

    Ok(Json(settings))
}

/// DELETE reset the settings document to `{}`
#[utoipa::path(
    delete,
    path = "/settings",
    responses(
        (status = 200, description = "Successfully cleared the settings document"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Settings store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    info!("DELETE settings document");

    SettingsApi::clear(app_state.settings_store(), &app_state.event_publisher).await?;

    Ok(Json(json!({ "ok": true })))
}
