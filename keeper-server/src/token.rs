//! Token issuance (§4.5): `token = base64(AES-GCM(login ‖ password))` under
//! a server-wide key. Deterministic by design -- see the crate-level docs
//! for why this is kept rather than replaced with a random token.

use keeper_crypto::{Cryptographer, CryptoError};

/// Mints tokens for newly (or re-)registering users. Holds one
/// [`Cryptographer`] bound to the server-wide key configured at startup.
pub struct TokenMinter {
    cryptographer: Cryptographer,
}

impl TokenMinter {
    pub fn new(server_key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            cryptographer: Cryptographer::new(server_key)?,
        })
    }

    /// Deterministic: the same `(login, password)` pair always mints the
    /// same token, which is exactly what makes re-registration idempotent
    /// (§8's "Idempotent registration" property) -- and exactly the
    /// weakness §9 flags (two servers sharing this key issue identical
    /// tokens for identical credentials).
    pub fn mint(&self, login: &str, password: &str) -> Result<String, CryptoError> {
        let mut material = Vec::with_capacity(login.len() + password.len());
        material.extend_from_slice(login.as_bytes());
        material.extend_from_slice(password.as_bytes());
        self.cryptographer.encrypt(&material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_credentials_mint_same_token() {
        let minter = TokenMinter::new(&[9u8; 16]).unwrap();
        let a = minter.mint("alice", "pw-ct").unwrap();
        let b = minter.mint("alice", "pw-ct").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_credentials_mint_different_tokens() {
        let minter = TokenMinter::new(&[9u8; 16]).unwrap();
        let a = minter.mint("alice", "pw-ct").unwrap();
        let b = minter.mint("bob", "pw-ct").unwrap();
        assert_ne!(a, b);
    }
}
