//! Administrator signing keypairs
//!
//! Ed25519 only; keys travel as hex the way the custody backend expects
//! them (64 hex chars each side).

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use thiserror::Error;

/// Errors from key generation or import
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid secret key hex: {0}")]
    InvalidHex(String),

    #[error("Secret key must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A generated or imported signing keypair, hex-encoded
#[derive(Debug, Clone)]
pub struct AdminKeypair {
    pub secret_hex: String,
    pub public_hex: String,
}

impl AdminKeypair {
    /// Generate a fresh keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    /// Import a keypair from a 64-hex-char secret key, deriving the public key
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(secret_hex).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(bytes.len()))?;

        let signing_key = SigningKey::from_bytes(&array);
        Ok(Self::from_signing_key(&signing_key))
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        Self {
            secret_hex: hex::encode(signing_key.to_bytes()),
            public_hex: hex::encode(signing_key.verifying_key().to_bytes()),
        }
    }
}
