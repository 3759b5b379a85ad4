use thiserror::Error;

/// Error type for key lifecycle operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Key storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Key generation failed: {0}")]
    Generation(String),

    #[error("Stored key material is corrupt: {0}")]
    Corrupt(String),
}
