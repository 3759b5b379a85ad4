pub mod errors;
pub mod jwk;
pub mod manager;

pub use errors::KeyError;
pub use jwk::Jwk;
pub use jwk::JwkSet;
pub use manager::KeyManager;
