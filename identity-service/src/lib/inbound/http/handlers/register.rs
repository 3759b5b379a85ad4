use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::dispatch::AuthCommand;
use crate::domain::identity::dispatch::AuthResult;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::RegisterPrincipal;
use crate::domain::identity::models::Role;
use crate::inbound::http::router::AppState;

/// Register a new principal.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<PrincipalData>, ApiError> {
    let command = AuthCommand::Register(body.try_into_command()?);

    match state.dispatcher.dispatch(command).await? {
        AuthResult::Registered(ref principal) => {
            Ok(ApiSuccess::new(StatusCode::CREATED, principal.into()))
        }
        other => Err(ApiError::InternalServerError(format!(
            "Unexpected dispatch result: {:?}",
            other
        ))),
    }
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    username: String,
    email: String,
    password: String,
    roles: Option<Vec<String>>,
}

impl RegisterRequestBody {
    fn try_into_command(self) -> Result<RegisterPrincipal, ApiError> {
        let roles = match self.roles {
            Some(labels) => Some(
                labels
                    .iter()
                    .map(|label| label.parse::<Role>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?,
            ),
            None => None,
        };

        Ok(RegisterPrincipal {
            username: self.username,
            email: self.email,
            password: self.password,
            roles,
        })
    }
}

/// Registered principal view; the password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Principal> for PrincipalData {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.to_string(),
            username: principal.username.as_str().to_string(),
            email: principal.email.as_str().to_string(),
            roles: principal.role_labels(),
            is_active: principal.is_active,
            created_at: principal.created_at,
        }
    }
}
