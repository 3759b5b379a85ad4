use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Declared kind of a signed token, immutable once minted.
///
/// Serialized as the `type` claim with the wire literals `access_token` and
/// `refresh_token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "access_token")]
    Access,

    #[serde(rename = "refresh_token")]
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access_token"),
            TokenKind::Refresh => write!(f, "refresh_token"),
        }
    }
}

/// The principal data a token is minted for.
///
/// Plain strings so the codec stays independent of the service's domain
/// types; the engine maps its principal into this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// Claim set embedded in a signed token.
///
/// Access tokens carry the full set; refresh tokens carry only `sub`, `iat`,
/// `exp` and `type` to keep their attack surface narrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp), strictly after `iat`
    pub exp: i64,

    /// Token kind discriminator
    #[serde(rename = "type")]
    pub kind: TokenKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

impl Claims {
    /// Build the claim set for an access token issued now.
    pub fn access(subject: &TokenSubject, scopes: Vec<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.id.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind: TokenKind::Access,
            username: Some(subject.username.clone()),
            email: Some(subject.email.clone()),
            roles: Some(subject.roles.clone()),
            scopes: Some(scopes),
        }
    }

    /// Build the claim set for a refresh token issued now.
    pub fn refresh(subject_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind: TokenKind::Refresh,
            username: None,
            email: None,
            roles: None,
            scopes: None,
        }
    }
}
