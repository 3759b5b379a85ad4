use std::fmt;
use std::str::FromStr;

use auth::Claims;
use auth::TokenSubject;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::PrincipalIdError;
use crate::identity::errors::RoleError;
use crate::identity::errors::UsernameError;

/// Principal unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Generate a new random principal ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a principal ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, PrincipalIdError> {
        Uuid::parse_str(s)
            .map(PrincipalId)
            .map_err(|e| PrincipalIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric,
/// underscore, and hyphen. The lower bound is a hard minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role label for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "guest" => Ok(Role::Guest),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

/// Principal aggregate entity.
///
/// The authenticated account this service manages. The identifier is
/// assigned once at creation and never changes; username and email
/// uniqueness is enforced by the credential store, not here.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Create a new active principal with a fresh identifier.
    ///
    /// An empty or absent role set falls back to the base `user` role; the
    /// set is never empty.
    pub fn new(
        username: Username,
        email: EmailAddress,
        password_hash: String,
        roles: Option<Vec<Role>>,
    ) -> Self {
        let now = Utc::now();
        let roles = match roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => vec![Role::User],
        };

        Self {
            id: PrincipalId::new(),
            username,
            email,
            password_hash,
            roles,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Add a role, ignoring duplicates.
    pub fn grant_role(&mut self, role: Role) {
        if !self.has_role(role) {
            self.roles.push(role);
            self.touch();
        }
    }

    /// Remove a role. The last remaining role is never removed.
    pub fn revoke_role(&mut self, role: Role) {
        if self.roles.len() > 1 && self.has_role(role) {
            self.roles.retain(|r| *r != role);
            self.touch();
        }
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Role labels as plain strings, the shape tokens carry.
    pub fn role_labels(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.to_string()).collect()
    }

    /// Claim inputs for token minting.
    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            id: self.id.to_string(),
            username: self.username.to_string(),
            email: self.email.to_string(),
            roles: self.role_labels(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Command to register a new principal.
///
/// Fields arrive raw; validation happens in the engine so every violation
/// can be reported at once.
#[derive(Debug, Clone)]
pub struct RegisterPrincipal {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Option<Vec<Role>>,
}

/// Issued token pair, the response shape of login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Token introspection outcome (RFC 7662 shape).
///
/// An invalid or expired token yields `active: false` with no claims; it is
/// never an error to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Introspection {
    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Introspection {
    pub fn active(claims: Claims) -> Self {
        Self {
            active: true,
            sub: Some(claims.sub),
            username: claims.username,
            email: claims.email,
            roles: claims.roles,
            exp: Some(claims.exp),
            iat: Some(claims.iat),
        }
    }

    pub fn inactive() -> Self {
        Self {
            active: false,
            sub: None,
            username: None,
            email: None,
            roles: None,
            exp: None,
            iat: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new(
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("alice@example.com".to_string()).unwrap(),
            "$argon2id$test_hash".to_string(),
            None,
        )
    }

    #[test]
    fn test_new_principal_defaults() {
        let principal = principal();

        assert!(principal.is_active);
        assert_eq!(principal.roles, vec![Role::User]);
        assert_eq!(principal.created_at, principal.updated_at);
    }

    #[test]
    fn test_empty_role_set_falls_back_to_base_role() {
        let principal = Principal::new(
            Username::new("bob".to_string()).unwrap(),
            EmailAddress::new("bob@example.com".to_string()).unwrap(),
            "hash".to_string(),
            Some(vec![]),
        );

        assert_eq!(principal.roles, vec![Role::User]);
    }

    #[test]
    fn test_grant_and_revoke_role() {
        let mut principal = principal();

        principal.grant_role(Role::Admin);
        assert!(principal.has_role(Role::Admin));

        // Duplicate grant is a no-op
        principal.grant_role(Role::Admin);
        assert_eq!(principal.roles.len(), 2);

        principal.revoke_role(Role::Admin);
        assert!(!principal.has_role(Role::Admin));
    }

    #[test]
    fn test_last_role_is_never_revoked() {
        let mut principal = principal();

        principal.revoke_role(Role::User);
        assert_eq!(principal.roles, vec![Role::User]);
    }

    #[test]
    fn test_deactivate_touches_updated_at() {
        let mut principal = principal();
        let before = principal.updated_at;

        principal.deactivate();
        assert!(!principal.is_active);
        assert!(principal.updated_at >= before);
    }

    #[test]
    fn test_username_validation() {
        assert!(Username::new("ab".to_string()).is_err());
        assert!(Username::new("a".repeat(33)).is_err());
        assert!(Username::new("has space".to_string()).is_err());
        assert!(Username::new("alice_01".to_string()).is_ok());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_token_subject_carries_role_labels() {
        let mut principal = principal();
        principal.grant_role(Role::Admin);

        let subject = principal.token_subject();
        assert_eq!(subject.id, principal.id.to_string());
        assert_eq!(subject.roles, vec!["user".to_string(), "admin".to_string()]);
    }
}
