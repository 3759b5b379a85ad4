use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

use crate::identity::dispatch::CommandKind;

/// Error for PrincipalId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Top-level error for all authentication operations.
///
/// Every failure is returned to the immediate caller as a typed value;
/// nothing is logged-and-swallowed inside the engine, and no retry happens
/// below this boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad input shape; lists every violated rule, not just the first.
    #[error("Validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    /// Wrong credential or unknown username. Intentionally a single message
    /// so callers cannot enumerate handles.
    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Account is inactive")]
    AccountInactive,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    /// Collaborator store failure; propagated without retry.
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// Programmer error: the dispatcher has no handler for this command.
    #[error("No handler registered for command: {0}")]
    UnroutableCommand(CommandKind),
}
