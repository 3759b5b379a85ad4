use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::dispatch::AuthCommand;
use crate::domain::identity::dispatch::AuthResult;
use crate::domain::identity::models::Introspection;
use crate::inbound::http::router::AppState;

/// Report whether a token is currently active, with its claims.
///
/// Invalid or expired tokens are a 200 with `active: false`, never an
/// error status.
pub async fn introspect(
    State(state): State<AppState>,
    Json(body): Json<IntrospectRequestBody>,
) -> Result<ApiSuccess<Introspection>, ApiError> {
    let command = AuthCommand::Introspect { token: body.token };

    match state.dispatcher.dispatch(command).await? {
        AuthResult::Introspection(introspection) => {
            Ok(ApiSuccess::new(StatusCode::OK, introspection))
        }
        other => Err(ApiError::InternalServerError(format!(
            "Unexpected dispatch result: {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntrospectRequestBody {
    token: String,
}
