use crate::AppState;
use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use log::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Shared-token check in front of the settings endpoints.
///
/// Accepts `Authorization: Bearer <token>` (scheme matched case-insensitively)
/// or a `?token=` query parameter. With no token configured every request
/// passes.
pub(crate) async fn require_admin(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = app_state.config.admin_api_token() else {
        return next.run(request).await;
    };

    let authorized = bearer_token(request.headers()) == Some(expected)
        || query_token(&request).as_deref() == Some(expected);

    if authorized {
        next.run(request).await
    } else {
        debug!(
            "Rejecting unauthenticated {} {}",
            request.method(),
            request.uri().path()
        );
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

fn query_token(request: &Request) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(request.uri()).ok()?;
    query.token.filter(|token| !token.is_empty())
}
