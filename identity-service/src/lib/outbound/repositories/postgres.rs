use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::PrincipalRepository;

const SELECT_PRINCIPAL: &str = r#"
    SELECT id, username, email, password_hash, roles, is_active, created_at, updated_at
    FROM principals
"#;

pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(filter: &str) -> String {
        format!("{} {}", SELECT_PRINCIPAL, filter)
    }
}

/// Raw row shape; roles are stored as a text array of role labels.
#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    /// A row that no longer parses as a valid principal means the store
    /// contents are corrupt, not that the request was bad.
    fn try_into_principal(self) -> Result<Principal, AuthError> {
        let username = Username::new(self.username)
            .map_err(|e| AuthError::StoreUnavailable(format!("Corrupt username in store: {e}")))?;
        let email = EmailAddress::new(self.email)
            .map_err(|e| AuthError::StoreUnavailable(format!("Corrupt email in store: {e}")))?;
        let roles = self
            .roles
            .iter()
            .map(|label| label.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuthError::StoreUnavailable(format!("Corrupt role in store: {e}")))?;

        Ok(Principal {
            id: PrincipalId(self.id),
            username,
            email,
            password_hash: self.password_hash,
            roles,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_unique_violation(e: sqlx::Error, principal: &Principal) -> AuthError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("principals_username_key") {
                return AuthError::DuplicateUsername(principal.username.as_str().to_string());
            }
            if db_err.constraint() == Some("principals_email_key") {
                return AuthError::DuplicateEmail(principal.email.as_str().to_string());
            }
        }
    }
    AuthError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn create(&self, principal: Principal) -> Result<Principal, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO principals (id, username, email, password_hash, roles, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(principal.id.0)
        .bind(principal.username.as_str())
        .bind(principal.email.as_str())
        .bind(&principal.password_hash)
        .bind(principal.role_labels())
        .bind(principal.is_active)
        .bind(principal.created_at)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &principal))?;

        Ok(principal)
    }

    async fn find_by_id(&self, id: &PrincipalId) -> Result<Option<Principal>, AuthError> {
        let row: Option<PrincipalRow> = sqlx::query_as(&Self::select("WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.map(PrincipalRow::try_into_principal).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<Principal>, AuthError> {
        let row: Option<PrincipalRow> = sqlx::query_as(&Self::select("WHERE username = $1"))
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.map(PrincipalRow::try_into_principal).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        let row: Option<PrincipalRow> = sqlx::query_as(&Self::select("WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row.map(PrincipalRow::try_into_principal).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM principals WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(exists.0)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM principals WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(exists.0)
    }

    async fn update(&self, principal: Principal) -> Result<Principal, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE principals
            SET username = $2, email = $3, password_hash = $4, roles = $5,
                is_active = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(principal.id.0)
        .bind(principal.username.as_str())
        .bind(principal.email.as_str())
        .bind(&principal.password_hash)
        .bind(principal.role_labels())
        .bind(principal.is_active)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &principal))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::PrincipalNotFound(principal.id.to_string()));
        }

        Ok(principal)
    }

    async fn list_all(&self) -> Result<Vec<Principal>, AuthError> {
        let rows: Vec<PrincipalRow> = sqlx::query_as(&Self::select("ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        rows.into_iter()
            .map(PrincipalRow::try_into_principal)
            .collect()
    }
}
