use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenKind;
use super::claims::TokenSubject;
use super::errors::TokenError;
use crate::keys::KeyManager;

const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Scopes granted to access tokens when the caller requests none.
pub const DEFAULT_SCOPES: &[&str] = &["read", "write"];

/// Validity windows for the two token kinds.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }
}

/// Encodes and decodes RS256-signed tokens.
///
/// Minting uses the private key; verification uses only the public key, so
/// any relying party holding the published JWK can verify independently.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    key_id: String,
    ttls: TokenTtls,
}

impl TokenCodec {
    /// Build a codec from a key manager, generating the pair first if needed.
    pub fn from_key_manager(keys: &KeyManager, ttls: TokenTtls) -> Result<Self, TokenError> {
        keys.ensure_keys()
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        let private_pem = keys
            .load_private_key()
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let public_pem = keys
            .load_public_key()
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        Self::from_pem(&private_pem, &public_pem, keys.key_id(), ttls)
    }

    /// Build a codec from PEM-encoded key halves.
    ///
    /// # Errors
    /// * `InvalidKey` - Either PEM does not parse as RSA key material
    pub fn from_pem(
        private_pem: &str,
        public_pem: &str,
        key_id: &str,
        ttls: TokenTtls,
    ) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            key_id: key_id.to_string(),
            ttls,
        })
    }

    /// Access token validity window, exposed for `expires_in` responses.
    pub fn access_ttl(&self) -> Duration {
        self.ttls.access
    }

    /// Mint a signed token for a subject.
    ///
    /// Access tokens carry the subject's roles plus the requested scopes
    /// (default `read write`); refresh tokens carry only the subject id.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn mint(
        &self,
        subject: &TokenSubject,
        kind: TokenKind,
        scopes: Option<Vec<String>>,
    ) -> Result<String, TokenError> {
        let claims = match kind {
            TokenKind::Access => {
                let scopes = scopes.unwrap_or_else(|| {
                    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
                });
                Claims::access(subject, scopes, self.ttls.access)
            }
            TokenKind::Refresh => Claims::refresh(&subject.id, self.ttls.refresh),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token's signature and expiry, returning its claim set.
    ///
    /// # Errors
    /// * `Expired` - Signature is valid but the clock has passed `exp`
    /// * `Invalid` - Malformed structure or signature mismatch
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Verify a token and additionally require a specific kind.
    ///
    /// The kind check runs after signature/expiry validation but before the
    /// claims are handed to the caller, so a refresh token is never accepted
    /// where an access token is expected and vice versa.
    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;

        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }
}
