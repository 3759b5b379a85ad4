use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::Deserialize;
use serde::Serialize;

/// Public key in JWK format (RFC 7517), suitable for publication so relying
/// parties can verify tokens without calling back into the service.
///
/// Built exclusively from public key material; no private component ever
/// appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always "RSA"
    pub kty: String,

    /// Key usage, always "sig"
    #[serde(rename = "use")]
    pub use_: String,

    /// Stable key identifier, echoed in token headers
    pub kid: String,

    /// Signing algorithm, always "RS256"
    pub alg: String,

    /// RSA modulus, base64url without padding, big-endian
    pub n: String,

    /// RSA public exponent, base64url without padding, big-endian
    pub e: String,
}

impl Jwk {
    pub fn from_rsa_public_key(key: &RsaPublicKey, kid: impl Into<String>) -> Self {
        Self {
            kty: "RSA".to_string(),
            use_: "sig".to_string(),
            kid: kid.into(),
            alg: "RS256".to_string(),
            n: URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
        }
    }
}

/// JWK set wrapper (RFC 7517 `{"keys": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}
