//! AES-128-GCM encryption with a key-derived, deterministic nonce.
//!
//! This reuses a single nonce per key rather than generating a fresh one per
//! call (the usual AES-GCM recommendation). That is intentional and carried
//! over from the system this crate reimplements: reusing the nonce makes
//! `Encrypt(key, plaintext)` a pure function of its inputs, which is what
//! lets the store layer detect a no-op update by comparing ciphertexts
//! without ever decrypting. It does mean two encryptions of the same
//! plaintext under the same key are indistinguishable from each other, and
//! that key reuse across unrelated plaintexts narrows the usual AES-GCM
//! nonce-uniqueness guarantee to "unique per key" rather than "unique per
//! message". Callers must not reuse a `Cryptographer`'s key across unrelated
//! trust domains.

mod error;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

pub use error::CryptoError;

/// AES-128 key size in bytes.
pub const KEY_SIZE: usize = 16;

/// AES-GCM nonce size in bytes.
const NONCE_SIZE: usize = 12;

/// Generate a fresh random AES-128 key.
pub fn generate_key() -> Vec<u8> {
    let mut key = vec![0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// An AES-128-GCM cipher bound to one key, with its nonce precomputed.
pub struct Cryptographer {
    cipher: Aes128Gcm,
    nonce: [u8; NONCE_SIZE],
}

impl Cryptographer {
    /// Build a cryptographer from a raw 16-byte key. The nonce is derived
    /// once, as the first 12 bytes of SHA-256(key), and reused for every
    /// `encrypt`/`decrypt` call made through this instance.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }

        let cipher = Aes128Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let digest = Sha256::digest(key);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&digest[..NONCE_SIZE]);

        Ok(Self { cipher, nonce })
    }

    /// Encrypt `plaintext`, returning base64 (raw, unpadded) ciphertext.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let nonce = Nonce::from_slice(&self.nonce);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        Ok(base64::engine::general_purpose::STANDARD_NO_PAD.encode(ciphertext))
    }

    /// Decrypt base64 (raw, unpadded) ciphertext back to plaintext.
    pub fn decrypt(&self, data: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let ciphertext = base64::engine::general_purpose::STANDARD_NO_PAD.decode(data)?;

        let nonce = Nonce::from_slice(&self.nonce);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

        Ok(Zeroizing::new(plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Vec<u8> {
        vec![7u8; KEY_SIZE]
    }

    #[test]
    fn roundtrip() {
        let c = Cryptographer::new(&key()).unwrap();
        let ct = c.encrypt(b"hunter2").unwrap();
        let pt = c.decrypt(&ct).unwrap();
        assert_eq!(&*pt, b"hunter2");
    }

    #[test]
    fn rejects_wrong_key_size() {
        assert!(matches!(
            Cryptographer::new(&[0u8; 8]),
            Err(CryptoError::InvalidKeySize { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn encryption_is_deterministic_per_key() {
        let c = Cryptographer::new(&key()).unwrap();
        let a = c.encrypt(b"same plaintext").unwrap();
        let b = c.encrypt(b"same plaintext").unwrap();
        assert_eq!(a, b, "same key + same plaintext must produce identical ciphertext");
    }

    #[test]
    fn different_plaintexts_produce_different_ciphertext() {
        let c = Cryptographer::new(&key()).unwrap();
        let a = c.encrypt(b"alpha").unwrap();
        let b = c.encrypt(b"bravo").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_keys_produce_different_nonces_and_ciphertext() {
        let c1 = Cryptographer::new(&key()).unwrap();
        let c2 = Cryptographer::new(&[9u8; KEY_SIZE]).unwrap();
        assert_ne!(c1.encrypt(b"x").unwrap(), c2.encrypt(b"x").unwrap());
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let c = Cryptographer::new(&key()).unwrap();
        let mut ct = c.encrypt(b"payload").unwrap();
        ct.push('A');
        assert!(c.decrypt(&ct).is_err());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let c1 = Cryptographer::new(&key()).unwrap();
        let c2 = Cryptographer::new(&[9u8; KEY_SIZE]).unwrap();
        let ct = c1.encrypt(b"payload").unwrap();
        assert!(c2.decrypt(&ct).is_err());
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let c = Cryptographer::new(&key()).unwrap();
        assert!(matches!(c.decrypt("not base64!!"), Err(CryptoError::Base64(_))));
    }

    #[test]
    fn generate_key_has_correct_size() {
        assert_eq!(generate_key().len(), KEY_SIZE);
    }
}
