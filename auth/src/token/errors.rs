use thiserror::Error;

use super::claims::TokenKind;

/// Error type for token minting and verification.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Key material unusable for signing: {0}")]
    InvalidKey(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    /// Signature mismatch or malformed structure. The message never echoes
    /// token or key material.
    #[error("Token is invalid")]
    Invalid,

    /// Signature checks out but the clock has passed `exp`. Distinguished so
    /// callers can retry with a refresh token instead of rejecting outright.
    #[error("Token is expired")]
    Expired,

    #[error("Wrong token kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
}
