//! Authentication infrastructure library
//!
//! Provides the cryptographic building blocks for the identity service:
//! - Password hashing (Argon2id)
//! - RSA key pair lifecycle and JWKS publication
//! - RS256 token minting and verification
//!
//! The service defines its own domain traits and adapts these implementations.
//! Nothing in this crate knows about principals or persistence; it operates on
//! plain claim values so it stays reusable across transports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("wrong_password", &hash));
//! ```
//!
//! ## Keys and Tokens
//! ```no_run
//! use auth::{KeyManager, TokenCodec, TokenKind, TokenSubject, TokenTtls};
//!
//! let keys = KeyManager::new("keys");
//! let codec = TokenCodec::from_key_manager(&keys, TokenTtls::default()).unwrap();
//!
//! let subject = TokenSubject {
//!     id: "user123".to_string(),
//!     username: "alice".to_string(),
//!     email: "alice@example.com".to_string(),
//!     roles: vec!["user".to_string()],
//! };
//! let token = codec.mint(&subject, TokenKind::Access, None).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//!
//! // Relying parties verify independently with the published key material.
//! let jwks = keys.jwks().unwrap();
//! ```

pub mod keys;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use keys::Jwk;
pub use keys::JwkSet;
pub use keys::KeyError;
pub use keys::KeyManager;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenKind;
pub use token::TokenSubject;
pub use token::TokenTtls;
