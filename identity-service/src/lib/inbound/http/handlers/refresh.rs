use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::dispatch::AuthCommand;
use crate::domain::identity::dispatch::AuthResult;
use crate::domain::identity::models::TokenPair;
use crate::inbound::http::router::AppState;

/// Exchange a refresh token for a fresh access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequestBody>,
) -> Result<ApiSuccess<TokenPair>, ApiError> {
    let command = AuthCommand::Refresh {
        refresh_token: body.refresh_token,
    };

    match state.dispatcher.dispatch(command).await? {
        AuthResult::Tokens(pair) => Ok(ApiSuccess::new(StatusCode::OK, pair)),
        other => Err(ApiError::InternalServerError(format!(
            "Unexpected dispatch result: {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequestBody {
    refresh_token: String,
}
