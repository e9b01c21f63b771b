use crate::{
    controller::{
        db_health_controller, event_controller, health_check_controller, settings_controller,
    },
    middleware::{
        auth::require_admin,
        cors::{cors_layer, preflight},
    },
    sse, AppState,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Settings Hub API"
        ),
        paths(
            health_check_controller::health_check,
            db_health_controller::read,
            settings_controller::read,
            settings_controller::update,
            settings_controller::delete,
            event_controller::read,
            event_controller::update,
            sse::handler::sse_handler,
        ),
        components(
            schemas(
                domain::Settings,
                domain::EventConfig,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "settings_hub", description = "Live settings document with change notifications")
        )
    )]
pub struct ApiDoc;

struct SecurityAddon;

// The shared admin token, sent as a bearer credential (or `?token=`).
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Value of ADMIN_API_TOKEN"))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(health_routes())
        .merge(db_health_routes(app_state.clone()))
        .merge(settings_routes(app_state.clone()))
        .merge(event_routes(app_state.clone()))
        .merge(stream_routes(app_state))
        .merge(api_doc_routes())
        .layer(cors)
        .layer(from_fn(preflight))
}

fn health_routes() -> Router {
    Router::new().route("/settings-health", get(health_check_controller::health_check))
}

fn db_health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/db-health", get(db_health_controller::read))
        .with_state(app_state)
}

fn settings_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/settings",
            get(settings_controller::read)
                .put(settings_controller::update)
                .delete(settings_controller::delete),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_admin))
        .with_state(app_state)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/settings/events/{event_type}",
            get(event_controller::read).put(event_controller::update),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_admin))
        .with_state(app_state)
}

fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/settings/stream", get(sse::handler::sse_handler))
        .route_layer(from_fn_with_state(app_state.clone(), require_admin))
        .with_state(app_state)
}

fn api_doc_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app_state, app_state_with};
    use axum::body::{Body, Bytes};
    use axum::http::{header, Method, Request, StatusCode};
    use clap::Parser;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use service::config::Config;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Reads the next data frame of a streaming body as text.
    async fn next_frame(body: &mut Body) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("a frame within the timeout")
            .expect("stream still open")
            .unwrap();
        let data: Bytes = frame.into_data().unwrap();
        String::from_utf8(data.to_vec()).unwrap()
    }

    fn frame_json(frame: &str) -> Value {
        let data = frame
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .unwrap_or_else(|| panic!("not a data frame: {frame:?}"));
        serde_json::from_str(data).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_open_even_with_a_token() {
        let app = define_routes(app_state(Some("secret")));
        let (status, body) = send(&app, Method::GET, "/settings-health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn db_health_reports_the_memory_backend() {
        let app = define_routes(app_state(Some("secret")));
        let (status, body) = send(&app, Method::GET, "/db-health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["driver"], json!("memory"));
    }

    #[tokio::test]
    async fn settings_start_empty() {
        let app = define_routes(app_state(None));
        let (status, body) = send(&app, Method::GET, "/settings", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn put_settings_merges_top_level_keys_and_events() {
        let app = define_routes(app_state(None));

        send(
            &app,
            Method::PUT,
            "/settings",
            r#"{"persist_until": 1700000000000, "events": {"overtime": {"disabled": true}}}"#,
        )
        .await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/settings",
            r#"{"timer_disabled": true, "events": {"overtime": {"display_mode": "big"}, "bad": 3}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "persist_until": 1700000000000_i64,
                "timer_disabled": true,
                "events": {"overtime": {"disabled": true, "display_mode": "big"}}
            })
        );
        assert_eq!(send(&app, Method::GET, "/settings", "").await.1, body);
    }

    #[tokio::test]
    async fn event_type_updates_ignore_unknown_fields() {
        let app = define_routes(app_state(None));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/settings/events/overtime",
            r#"{"disabled": true, "bogus": 1}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"disabled": true}));

        let (_, body) = send(
            &app,
            Method::PUT,
            "/settings/events/overtime",
            r#"{"display_mode": "big"}"#,
        )
        .await;
        assert_eq!(body, json!({"disabled": true, "display_mode": "big"}));

        let (_, body) = send(&app, Method::GET, "/settings/events/overtime", "").await;
        assert_eq!(body, json!({"disabled": true, "display_mode": "big"}));
    }

    #[tokio::test]
    async fn unknown_event_type_reads_as_empty() {
        let app = define_routes(app_state(None));
        let (status, body) = send(&app, Method::GET, "/settings/events/halftime", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn delete_then_get_is_empty() {
        let app = define_routes(app_state(None));
        send(&app, Method::PUT, "/settings", r#"{"timer_disabled": true}"#).await;

        let (status, body) = send(&app, Method::DELETE, "/settings", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        assert_eq!(send(&app, Method::GET, "/settings", "").await.1, json!({}));
    }

    #[tokio::test]
    async fn non_object_and_malformed_bodies_are_rejected() {
        let app = define_routes(app_state(None));

        for (uri, body) in [
            ("/settings", "[1, 2]"),
            ("/settings", "\"timer_disabled\""),
            ("/settings", "{\"timer_disabled\": "),
            ("/settings", r#"{"timer_disabled": "yes"}"#),
            ("/settings/events/overtime", "42"),
            ("/settings/events/overtime", r#"{"disabled": "yes"}"#),
        ] {
            let (status, json) = send(&app, Method::PUT, uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(json, json!({"error": "Invalid JSON"}));
        }

        assert_eq!(send(&app, Method::GET, "/settings", "").await.1, json!({}));
    }

    #[tokio::test]
    async fn settings_endpoints_require_the_token_when_configured() {
        let app = define_routes(app_state(Some("secret")));

        let (status, body) = send(&app, Method::GET, "/settings", "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "unauthorized"}));

        let (status, _) = send(&app, Method::PUT, "/settings/events/overtime", "{}").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/settings?token=secret", "").await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/settings")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn any_options_request_is_no_content() {
        let app = define_routes(app_state(Some("secret")));

        for uri in ["/settings", "/settings/events/overtime", "/anything/else"] {
            let request = Request::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT, "{uri}");
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn preflight_carries_cors_headers() {
        let app = define_routes(app_state(None));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/settings")
            .header(header::ORIGIN, "http://localhost:8000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_string();
        for method in ["GET", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(method), "{methods}");
        }
    }

    #[tokio::test]
    async fn explicit_origins_allow_credentials() {
        let config = Config::try_parse_from([
            "settings_hub",
            "--storage-backend",
            "memory",
            "--allowed-origins",
            "https://grid.example.com",
        ])
        .unwrap()
        .set_admin_api_token(None);
        let app = define_routes(app_state_with(config));

        let request = Request::builder()
            .uri("/settings-health")
            .header(header::ORIGIN, "https://grid.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://grid.example.com"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn openapi_document_lists_the_settings_paths() {
        let app = define_routes(app_state(Some("secret")));
        let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", "").await;

        assert_eq!(status, StatusCode::OK);
        for path in ["/settings", "/settings/events/{event_type}", "/settings/stream"] {
            assert!(body["paths"].get(path).is_some(), "{path}");
        }
    }

    #[tokio::test]
    async fn stream_sends_init_then_every_change() {
        let app_state = app_state(None);
        let sse_manager = app_state.sse_manager.clone();
        let app = define_routes(app_state);

        send(&app, Method::PUT, "/settings", r#"{"timer_disabled": true}"#).await;

        let request = Request::builder()
            .uri("/settings/stream")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        let mut body = response.into_body();

        assert_eq!(
            frame_json(&next_frame(&mut body).await),
            json!({"type": "init", "settings": {"timer_disabled": true}})
        );
        assert_eq!(sse_manager.subscriber_count(), 1);

        let (_, event) = send(
            &app,
            Method::PUT,
            "/settings/events/overtime",
            r#"{"disabled": true}"#,
        )
        .await;
        assert_eq!(event, json!({"disabled": true}));
        assert_eq!(
            frame_json(&next_frame(&mut body).await),
            json!({
                "type": "settings",
                "settings": {"timer_disabled": true, "events": {"overtime": {"disabled": true}}}
            })
        );

        send(&app, Method::DELETE, "/settings", "").await;
        assert_eq!(
            frame_json(&next_frame(&mut body).await),
            json!({"type": "settings", "settings": {}})
        );

        drop(body);
        assert_eq!(sse_manager.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_requires_the_token_when_configured() {
        let app_state = app_state(Some("secret"));
        let sse_manager = app_state.sse_manager.clone();
        let app = define_routes(app_state);

        let (status, _) = send(&app, Method::GET, "/settings/stream", "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(sse_manager.subscriber_count(), 0);

        let request = Request::builder()
            .uri("/settings/stream?token=secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sse_manager.subscriber_count(), 1);

        drop(response);
        assert_eq!(sse_manager.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn repeated_stream_connections_do_not_accumulate() {
        let app_state = app_state(None);
        let sse_manager = app_state.sse_manager.clone();
        let app = define_routes(app_state);

        for _ in 0..20 {
            let request = Request::builder()
                .uri("/settings/stream")
                .body(Body::empty())
                .unwrap();
            let mut body = app.clone().oneshot(request).await.unwrap().into_body();
            next_frame(&mut body).await;
            drop(body);
        }

        assert_eq!(sse_manager.subscriber_count(), 0);
    }
}
