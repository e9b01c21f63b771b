use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET liveness of the settings API
#[utoipa::path(
    get,
    path = "/settings-health",
    responses(
        (status = 200, description = "Settings API is up and responding to requests"),
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
