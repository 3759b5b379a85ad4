use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::pkcs8::EncodePrivateKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::pkcs8::LineEnding;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;

use super::errors::KeyError;
use super::jwk::Jwk;
use super::jwk::JwkSet;

const DEFAULT_KEY_SIZE: usize = 2048;
const DEFAULT_KEY_ID: &str = "identity-svc-key-1";

const PRIVATE_KEY_FILE: &str = "private_key.pem";
const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// Manages the RSA key pair used for token signing and JWKS publication.
///
/// Exactly one pair is current for the lifetime of the process. Both PEM
/// halves are persisted under `keys_dir` as a unit: temp files first, then
/// renamed into place, so a crash never leaves one half without the other.
pub struct KeyManager {
    keys_dir: PathBuf,
    key_size: usize,
    key_id: String,
    // Serializes first-time generation so concurrent callers observe a
    // single winner.
    init: Mutex<()>,
}

impl KeyManager {
    /// Create a key manager storing PEM files under `keys_dir`.
    ///
    /// Uses a 2048-bit modulus and the default key identifier. Nothing is
    /// generated until `ensure_keys` (or a load) runs.
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self::with_key_size(keys_dir, DEFAULT_KEY_SIZE)
    }

    /// Create a key manager with an explicit modulus size in bits.
    pub fn with_key_size(keys_dir: impl Into<PathBuf>, key_size: usize) -> Self {
        Self {
            keys_dir: keys_dir.into(),
            key_size,
            key_id: DEFAULT_KEY_ID.to_string(),
            init: Mutex::new(()),
        }
    }

    /// Stable key identifier published in the JWKS and token headers.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn private_key_path(&self) -> PathBuf {
        self.keys_dir.join(PRIVATE_KEY_FILE)
    }

    fn public_key_path(&self) -> PathBuf {
        self.keys_dir.join(PUBLIC_KEY_FILE)
    }

    /// Guarantee a usable key pair exists, generating one if absent.
    ///
    /// Idempotent: when both PEM files are already present this is a no-op
    /// and the stored pair is left untouched.
    ///
    /// # Errors
    /// * `Generation` - RSA key generation or PEM encoding failed
    /// * `Storage` - Persisting the PEM files failed
    pub fn ensure_keys(&self) -> Result<(), KeyError> {
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());

        if self.private_key_path().exists() && self.public_key_path().exists() {
            return Ok(());
        }

        self.generate_keys()
    }

    fn generate_keys(&self) -> Result<(), KeyError> {
        tracing::info!(
            key_size = self.key_size,
            keys_dir = %self.keys_dir.display(),
            "Generating RSA key pair"
        );

        fs::create_dir_all(&self.keys_dir)?;

        // Public exponent 65537, per RsaPrivateKey::new.
        let private_key = RsaPrivateKey::new(&mut OsRng, self.key_size)
            .map_err(|e| KeyError::Generation(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(e.to_string()))?;

        // Both halves are written as a unit: stage to temp files, then rename.
        let private_tmp = self.keys_dir.join(format!("{}.tmp", PRIVATE_KEY_FILE));
        let public_tmp = self.keys_dir.join(format!("{}.tmp", PUBLIC_KEY_FILE));

        let staged = fs::write(&private_tmp, private_pem.as_bytes())
            .and_then(|_| fs::write(&public_tmp, public_pem.as_bytes()));
        if let Err(e) = staged {
            let _ = fs::remove_file(&private_tmp);
            let _ = fs::remove_file(&public_tmp);
            return Err(e.into());
        }

        fs::rename(&private_tmp, self.private_key_path())?;
        fs::rename(&public_tmp, self.public_key_path())?;

        Ok(())
    }

    /// Load the private signing key in PEM format, generating the pair first
    /// if it does not exist yet.
    ///
    /// # Errors
    /// * `Storage` - Key files are present but unreadable
    /// * `Generation` - First-time generation failed
    pub fn load_private_key(&self) -> Result<String, KeyError> {
        self.load_key(&self.private_key_path())
    }

    /// Load the public verification key in PEM format, generating the pair
    /// first if it does not exist yet.
    pub fn load_public_key(&self) -> Result<String, KeyError> {
        self.load_key(&self.public_key_path())
    }

    fn load_key(&self, path: &Path) -> Result<String, KeyError> {
        if !path.exists() {
            self.ensure_keys()?;
        }

        Ok(fs::read_to_string(path)?)
    }

    /// Derive the public key's JWK representation.
    ///
    /// Pure function of the stored public key; deterministic for a fixed
    /// pair and never touches private material.
    ///
    /// # Errors
    /// * `Corrupt` - Stored public key PEM does not parse
    pub fn public_jwk(&self) -> Result<Jwk, KeyError> {
        let pem = self.load_public_key()?;
        let public_key =
            RsaPublicKey::from_public_key_pem(&pem).map_err(|e| KeyError::Corrupt(e.to_string()))?;

        Ok(Jwk::from_rsa_public_key(&public_key, self.key_id.clone()))
    }

    /// The full JWK set for publication at the JWKS endpoint.
    pub fn jwks(&self) -> Result<JwkSet, KeyError> {
        Ok(JwkSet {
            keys: vec![self.public_jwk()?],
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    // 512-bit keys keep generation fast; size is not under test here.
    const TEST_KEY_SIZE: usize = 512;

    #[test]
    fn test_ensure_keys_creates_both_halves() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        manager.ensure_keys().expect("Failed to generate keys");

        assert!(dir.path().join(PRIVATE_KEY_FILE).exists());
        assert!(dir.path().join(PUBLIC_KEY_FILE).exists());
    }

    #[test]
    fn test_ensure_keys_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        manager.ensure_keys().expect("First ensure failed");
        let private_before = fs::read(dir.path().join(PRIVATE_KEY_FILE)).unwrap();
        let public_before = fs::read(dir.path().join(PUBLIC_KEY_FILE)).unwrap();

        manager.ensure_keys().expect("Second ensure failed");
        let private_after = fs::read(dir.path().join(PRIVATE_KEY_FILE)).unwrap();
        let public_after = fs::read(dir.path().join(PUBLIC_KEY_FILE)).unwrap();

        assert_eq!(private_before, private_after);
        assert_eq!(public_before, public_after);
    }

    #[test]
    fn test_load_triggers_generation() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        let private_pem = manager.load_private_key().expect("Failed to load");
        let public_pem = manager.load_public_key().expect("Failed to load");

        assert!(private_pem.contains("BEGIN PRIVATE KEY"));
        assert!(public_pem.contains("BEGIN PUBLIC KEY"));
    }

    #[test]
    fn test_public_jwk_shape_and_determinism() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        let first = manager.public_jwk().expect("Failed to derive JWK");
        let second = manager.public_jwk().expect("Failed to derive JWK");

        assert_eq!(first, second);
        assert_eq!(first.kty, "RSA");
        assert_eq!(first.use_, "sig");
        assert_eq!(first.alg, "RS256");
        assert_eq!(first.kid, manager.key_id());
        assert!(!first.n.is_empty());
        // 65537 big-endian is 0x01 0x00 0x01
        assert_eq!(first.e, "AQAB");
        // base64url, no padding
        assert!(!first.n.contains('='));
        assert!(!first.n.contains('+'));
        assert!(!first.n.contains('/'));
    }

    #[test]
    fn test_jwk_carries_no_private_material() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        let private_pem = manager.load_private_key().unwrap();
        let jwk = manager.public_jwk().unwrap();
        let serialized = serde_json::to_string(&jwk).unwrap();

        // No base64 line of the private PEM body may leak into the JWK.
        for line in private_pem
            .lines()
            .filter(|l| !l.starts_with("-----") && !l.is_empty())
        {
            assert!(!serialized.contains(line));
        }
    }

    #[test]
    fn test_jwks_wraps_single_key() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::with_key_size(dir.path(), TEST_KEY_SIZE);

        let jwks = manager.jwks().expect("Failed to build JWKS");
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0], manager.public_jwk().unwrap());
    }
}
