use auth::JwkSet;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// JSON Web Key Set endpoint; serves the public verification key.
pub async fn jwks(State(state): State<AppState>) -> Result<Json<JwkSet>, ApiError> {
    let jwks = state
        .key_manager
        .jwks()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(Json(jwks))
}

/// OpenID Connect Discovery document.
pub async fn openid_configuration(State(state): State<AppState>) -> Json<Value> {
    let issuer = &state.issuer;

    Json(json!({
        "issuer": issuer,
        "token_endpoint": format!("{issuer}/api/v1/auth/token"),
        "jwks_uri": format!("{issuer}/.well-known/jwks.json"),
        "introspection_endpoint": format!("{issuer}/api/v1/auth/introspect"),
        "response_types_supported": ["token"],
        "grant_types_supported": ["password", "refresh_token"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["RS256"],
        "claims_supported": ["sub", "exp", "iat", "username", "email", "roles"],
    }))
}

/// Liveness probe.
pub async fn health() -> ApiSuccess<HealthData> {
    ApiSuccess::new(
        StatusCode::OK,
        HealthData {
            status: "ok".to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthData {
    pub status: String,
}
