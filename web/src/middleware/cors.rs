use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{ALLOW, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// CORS headers for every response: the configured origins, the methods the
/// API serves and the two request headers clients send. Credentials are only
/// allowed for an explicit origin list.
pub(crate) fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Answers every `OPTIONS` request with `204 No Content`, keeping whatever
/// CORS headers the inner layers attached.
pub(crate) async fn preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, _body) = next.run(request).await.into_parts();
    parts.status = StatusCode::NO_CONTENT;
    for header in [ALLOW, CONTENT_TYPE, CONTENT_LENGTH] {
        parts.headers.remove(header);
    }

    Response::from_parts(parts, Body::empty())
}
