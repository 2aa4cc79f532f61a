use thiserror::Error;

/// Errors surfaced by [`crate::Cryptographer`].
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}
