use std::sync::Arc;
use std::time::Duration;

use auth::KeyManager;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::discovery::health;
use super::handlers::discovery::jwks;
use super::handlers::discovery::openid_configuration;
use super::handlers::introspect::introspect;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::token::token;
use crate::domain::identity::dispatch::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub key_manager: Arc<KeyManager>,
    pub issuer: String,
}

pub fn create_router(
    dispatcher: Arc<Dispatcher>,
    key_manager: Arc<KeyManager>,
    issuer: String,
) -> Router {
    let state = AppState {
        dispatcher,
        key_manager,
        issuer,
    };

    let auth_routes = Router::new()
        .route("/api/v1/auth/token", post(token))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/introspect", post(introspect))
        .route("/api/v1/users", post(register));

    let discovery_routes = Router::new()
        .route("/.well-known/jwks.json", get(jwks))
        .route("/.well-known/openid-configuration", get(openid_configuration))
        .route("/health", get(health));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(auth_routes)
        .merge(discovery_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
