//! Application router assembly.
//!
//! [`build_app_router`] stacks the HTTP middleware around the route tree
//! in one place, so the binary entrypoint stays a plain startup script.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Assemble the route tree and middleware into the served [`Router`].
///
/// Layers apply bottom-up: CORS first, then request-id assignment,
/// tracing, request-id propagation, the request timeout, and panic
/// recovery outermost.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        // /health stays outside the /api/v1 prefix.
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        // Turn handler panics into 500s instead of dropped connections.
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Echo the request id back on the response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Assign a UUID request id when the client sent none.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer from the configured origin list.
///
/// An unparseable origin panics at startup; misconfiguration should
/// stop the server, not silently drop an origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;

    fn config_with_origins(origins: &[&str]) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            cors_origins: origins.iter().map(|s| s.to_string()).collect(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            autosave_delay_ms: 2000,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_days: 7,
            },
        }
    }

    #[test]
    fn cors_layer_accepts_valid_origins() {
        let config =
            config_with_origins(&["http://localhost:5173", "https://app.example.com"]);
        build_cors_layer(&config);
    }

    #[test]
    #[should_panic(expected = "Invalid CORS origin")]
    fn cors_layer_rejects_malformed_origin() {
        let config = config_with_origins(&["not a url\u{7f}"]);
        build_cors_layer(&config);
    }
}
