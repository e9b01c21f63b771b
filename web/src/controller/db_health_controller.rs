use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::settings as SettingsApi;
use log::*;

/// GET connectivity diagnostics for the settings store
#[utoipa::path(
    get,
    path = "/db-health",
    responses(
        (status = 200, description = "`{ok, driver, database, host}`, plus `error` when `ok` is false"),
    )
)]
pub async fn read(State(app_state): State<AppState>) -> impl IntoResponse {
    let diagnostics = SettingsApi::diagnostics(app_state.settings_store()).await;

    if !diagnostics.ok {
        warn!("Settings store health check failed: {diagnostics:?}");
    }

    Json(diagnostics)
}
