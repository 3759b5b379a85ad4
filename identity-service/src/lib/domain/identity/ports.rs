use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::identity::models::Introspection;
use crate::identity::models::Principal;
use crate::identity::models::PrincipalId;
use crate::identity::models::RegisterPrincipal;
use crate::identity::models::TokenPair;
use crate::identity::models::Username;

/// Persistence boundary for the principal aggregate.
///
/// Uniqueness of username and email is this collaborator's responsibility.
/// Implementations surface infrastructure failures as `StoreUnavailable`;
/// the engine propagates them without retry.
#[async_trait]
pub trait PrincipalRepository: Send + Sync + 'static {
    /// Persist a new principal.
    ///
    /// # Errors
    /// * `DuplicateUsername` - Username is already taken
    /// * `DuplicateEmail` - Email is already registered
    /// * `StoreUnavailable` - Store operation failed
    async fn create(&self, principal: Principal) -> Result<Principal, AuthError>;

    /// Retrieve a principal by identifier (None if not found).
    async fn find_by_id(&self, id: &PrincipalId) -> Result<Option<Principal>, AuthError>;

    /// Retrieve a principal by username (None if not found).
    async fn find_by_username(&self, username: &Username) -> Result<Option<Principal>, AuthError>;

    /// Retrieve a principal by email address (None if not found).
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError>;

    /// Check whether a username is already taken.
    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;

    /// Check whether an email address is already registered.
    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError>;

    /// Update an existing principal.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - No principal with this identifier
    /// * `StoreUnavailable` - Store operation failed
    async fn update(&self, principal: Principal) -> Result<Principal, AuthError>;

    /// Retrieve all principals.
    async fn list_all(&self) -> Result<Vec<Principal>, AuthError>;
}

/// Port for the authentication engine.
///
/// Stateless request/response protocol; no session state is retained
/// between calls, so implementations are freely shareable across tasks.
#[async_trait]
pub trait AuthenticationPort: Send + Sync + 'static {
    /// Authenticate a principal by username and password.
    ///
    /// # Errors
    /// * `AuthenticationFailed` - Unknown username or wrong password
    ///   (deliberately indistinguishable)
    /// * `AccountInactive` - Credential valid but the account is disabled
    /// * `StoreUnavailable` - Lookup failed
    async fn login(&self, username: &str, password: &str) -> Result<Principal, AuthError>;

    /// Mint an access/refresh token pair for an authenticated principal.
    ///
    /// No token is persisted or tracked; a minted token stays valid until
    /// its own expiry regardless of later account changes.
    async fn issue_token_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The new access token is bound to the principal's current role set,
    /// not the roles at original login time. The refresh token is returned
    /// unchanged (no rotation).
    ///
    /// # Errors
    /// * `Token(WrongKind)` - An access token was presented instead
    /// * `Token(Expired)` / `Token(Invalid)` - Refresh token unusable
    /// * `AuthenticationFailed` - Subject no longer exists
    /// * `AccountInactive` - Subject's account is disabled
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Register a new principal.
    ///
    /// # Errors
    /// * `ValidationFailed` - Input violates credential rules (all
    ///   violations listed)
    /// * `DuplicateUsername` / `DuplicateEmail` - Already taken
    async fn register(&self, command: RegisterPrincipal) -> Result<Principal, AuthError>;

    /// Inspect a token without failing on invalid input.
    ///
    /// Invalid or expired tokens yield `active: false`.
    async fn introspect(&self, token: &str) -> Result<Introspection, AuthError>;
}
