use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenError;
use auth::TokenKind;

use crate::identity::errors::AuthError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Introspection;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::RegisterPrincipal;
use crate::identity::models::TokenPair;
use crate::identity::models::Username;
use crate::identity::ports::AuthenticationPort;
use crate::identity::ports::PrincipalRepository;

const MIN_PASSWORD_LENGTH: usize = 6;
const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Authentication engine implementation.
///
/// Orchestrates credential verification, token issuance and the
/// refresh-exchange protocol over an injected credential store. Stateless
/// between requests.
pub struct AuthService<R>
where
    R: PrincipalRepository,
{
    repository: Arc<R>,
    password_hasher: PasswordHasher,
    token_codec: Arc<TokenCodec>,
}

impl<R> AuthService<R>
where
    R: PrincipalRepository,
{
    /// Create a new authentication engine with injected dependencies.
    pub fn new(repository: Arc<R>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            repository,
            password_hasher: PasswordHasher::new(),
            token_codec,
        }
    }

    fn require_active(principal: &Principal) -> Result<(), AuthError> {
        if principal.is_active {
            Ok(())
        } else {
            Err(AuthError::AccountInactive)
        }
    }
}

#[async_trait]
impl<R> AuthenticationPort for AuthService<R>
where
    R: PrincipalRepository,
{
    async fn login(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        // A malformed handle cannot exist, so it collapses into the same
        // generic denial as an unknown one.
        let username = Username::new(username.to_string())
            .map_err(|_| AuthError::AuthenticationFailed)?;

        let principal = self
            .repository
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::AuthenticationFailed)?;

        Self::require_active(&principal)?;

        if !self
            .password_hasher
            .verify(password, &principal.password_hash)
        {
            return Err(AuthError::AuthenticationFailed);
        }

        Ok(principal)
    }

    async fn issue_token_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let subject = principal.token_subject();

        let access_token = self.token_codec.mint(&subject, TokenKind::Access, None)?;
        let refresh_token = self.token_codec.mint(&subject, TokenKind::Refresh, None)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.token_codec.access_ttl().num_seconds(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // The kind check runs before any subject lookup.
        let claims = self
            .token_codec
            .verify_kind(refresh_token, TokenKind::Refresh)?;

        let id = PrincipalId::from_string(&claims.sub).map_err(|_| TokenError::Invalid)?;

        let principal = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or(AuthError::AuthenticationFailed)?;

        Self::require_active(&principal)?;

        // Minting from the re-loaded principal is what propagates role
        // changes on next refresh.
        let access_token =
            self.token_codec
                .mint(&principal.token_subject(), TokenKind::Access, None)?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.token_codec.access_ttl().num_seconds(),
        })
    }

    async fn register(&self, command: RegisterPrincipal) -> Result<Principal, AuthError> {
        let mut violations = Vec::new();

        let username = match Username::new(command.username.clone()) {
            Ok(username) => Some(username),
            Err(e) => {
                violations.push(e.to_string());
                None
            }
        };

        let email = match EmailAddress::new(command.email.clone()) {
            Ok(email) => Some(email),
            Err(e) => {
                violations.push(e.to_string());
                None
            }
        };

        if command.password.len() < MIN_PASSWORD_LENGTH {
            violations.push(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            ));
        }

        let (username, email) = match (username, email) {
            (Some(username), Some(email)) if violations.is_empty() => (username, email),
            _ => return Err(AuthError::ValidationFailed(violations)),
        };

        if self
            .repository
            .exists_by_username(username.as_str())
            .await?
        {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        if self.repository.exists_by_email(email.as_str()).await? {
            return Err(AuthError::DuplicateEmail(email.to_string()));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;
        let principal = Principal::new(username, email, password_hash, command.roles);

        self.repository.create(principal).await
    }

    async fn introspect(&self, token: &str) -> Result<Introspection, AuthError> {
        match self.token_codec.verify(token) {
            Ok(claims) => Ok(Introspection::active(claims)),
            Err(TokenError::Expired) | Err(TokenError::Invalid) => Ok(Introspection::inactive()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use auth::KeyManager;
    use auth::TokenTtls;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::identity::models::Role;

    mock! {
        pub TestPrincipalRepository {}

        #[async_trait]
        impl PrincipalRepository for TestPrincipalRepository {
            async fn create(&self, principal: Principal) -> Result<Principal, AuthError>;
            async fn find_by_id(&self, id: &PrincipalId) -> Result<Option<Principal>, AuthError>;
            async fn find_by_username(&self, username: &Username) -> Result<Option<Principal>, AuthError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError>;
            async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;
            async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError>;
            async fn update(&self, principal: Principal) -> Result<Principal, AuthError>;
            async fn list_all(&self) -> Result<Vec<Principal>, AuthError>;
        }
    }

    // Key generation is slow enough to share one codec across tests.
    fn test_codec() -> Arc<TokenCodec> {
        static CODEC: std::sync::OnceLock<Arc<TokenCodec>> = std::sync::OnceLock::new();
        CODEC
            .get_or_init(|| {
                let dir = tempfile::tempdir().unwrap();
                let keys = KeyManager::new(dir.path());
                Arc::new(TokenCodec::from_key_manager(&keys, TokenTtls::default()).unwrap())
            })
            .clone()
    }

    fn service(repository: MockTestPrincipalRepository) -> AuthService<MockTestPrincipalRepository> {
        AuthService::new(Arc::new(repository), test_codec())
    }

    fn principal_with_password(password: &str) -> Principal {
        let hash = PasswordHasher::new().hash(password).unwrap();
        Principal::new(
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("alice@example.com".to_string()).unwrap(),
            hash,
            None,
        )
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut repository = MockTestPrincipalRepository::new();
        let stored = principal_with_password("secret1");
        let returned = stored.clone();

        repository
            .expect_find_by_username()
            .withf(|u| u.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let service = service(repository);
        let principal = service.login("alice", "secret1").await.unwrap();

        assert_eq!(principal.id, stored.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut repository = MockTestPrincipalRepository::new();
        let stored = principal_with_password("secret1");

        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let service = service(repository);
        let result = service.login("alice", "wrong").await;

        assert!(matches!(result, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_login_unknown_username_same_error_as_wrong_password() {
        let mut repository = MockTestPrincipalRepository::new();

        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository);
        let result = service.login("nobody", "secret1").await;

        assert!(matches!(result, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_login_inactive_account() {
        let mut repository = MockTestPrincipalRepository::new();
        let mut stored = principal_with_password("secret1");
        stored.deactivate();

        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let service = service(repository);
        let result = service.login("alice", "secret1").await;

        assert!(matches!(result, Err(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_issue_token_pair_shape() {
        let repository = MockTestPrincipalRepository::new();
        let service = service(repository);
        let principal = principal_with_password("secret1");

        let pair = service.issue_token_pair(&principal).await.unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 30 * 60);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let repository = MockTestPrincipalRepository::new();
        let service = service(repository);
        let principal = principal_with_password("secret1");

        let pair = service.issue_token_pair(&principal).await.unwrap();
        let result = service.refresh(&pair.access_token).await;

        assert!(matches!(
            result,
            Err(AuthError::Token(TokenError::WrongKind { .. }))
        ));
    }

    #[tokio::test]
    async fn test_refresh_mints_from_current_roles() {
        let mut repository = MockTestPrincipalRepository::new();
        let principal = principal_with_password("secret1");
        let id = principal.id;

        // The principal was promoted since the refresh token was issued.
        let mut reloaded = principal.clone();
        reloaded.grant_role(Role::Admin);

        repository
            .expect_find_by_id()
            .withf(move |candidate| *candidate == id)
            .times(1)
            .returning(move |_| Ok(Some(reloaded.clone())));

        let service = service(repository);
        let pair = service.issue_token_pair(&principal).await.unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();

        // Same refresh token comes back unchanged.
        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert_ne!(refreshed.access_token, pair.access_token);

        let claims = test_codec().verify(&refreshed.access_token).unwrap();
        assert_eq!(
            claims.roles,
            Some(vec!["user".to_string(), "admin".to_string()])
        );
    }

    #[tokio::test]
    async fn test_refresh_unknown_subject() {
        let mut repository = MockTestPrincipalRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository);
        let principal = principal_with_password("secret1");
        let pair = service.issue_token_pair(&principal).await.unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_refresh_inactive_subject() {
        let mut repository = MockTestPrincipalRepository::new();
        let principal = principal_with_password("secret1");

        let mut reloaded = principal.clone();
        reloaded.deactivate();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(reloaded.clone())));

        let service = service(repository);
        let pair = service.issue_token_pair(&principal).await.unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_register_success_with_default_role() {
        let mut repository = MockTestPrincipalRepository::new();

        repository
            .expect_exists_by_username()
            .withf(|username| username == "alice")
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_exists_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_create()
            .withf(|p| {
                p.username.as_str() == "alice"
                    && p.roles == vec![Role::User]
                    && p.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|p| Ok(p));

        let service = service(repository);
        let principal = service
            .register(RegisterPrincipal {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
                roles: None,
            })
            .await
            .unwrap();

        assert!(principal.is_active);
    }

    #[tokio::test]
    async fn test_register_lists_all_violations() {
        let repository = MockTestPrincipalRepository::new();
        let service = service(repository);

        let result = service
            .register(RegisterPrincipal {
                username: "ab".to_string(),
                email: "not-an-email".to_string(),
                password: "short".to_string(),
                roles: None,
            })
            .await;

        match result {
            Err(AuthError::ValidationFailed(violations)) => {
                assert_eq!(violations.len(), 3);
            }
            other => panic!("expected ValidationFailed, got {:?}", other.map(|p| p.id)),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let mut repository = MockTestPrincipalRepository::new();

        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(true));

        let service = service(repository);
        let result = service
            .register(RegisterPrincipal {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
                roles: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_introspect_valid_and_garbage() {
        let repository = MockTestPrincipalRepository::new();
        let service = service(repository);
        let principal = principal_with_password("secret1");

        let pair = service.issue_token_pair(&principal).await.unwrap();

        let active = service.introspect(&pair.access_token).await.unwrap();
        assert!(active.active);
        assert_eq!(active.sub, Some(principal.id.to_string()));
        assert_eq!(active.username, Some("alice".to_string()));
        assert!(active.exp.is_some());

        let inactive = service.introspect("garbage").await.unwrap();
        assert!(!inactive.active);
        assert!(inactive.sub.is_none());
    }
}
