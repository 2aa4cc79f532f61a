//! The local `User` entity.

use serde::{Deserialize, Serialize};

/// A registered user, as held in the client's local store.
///
/// `crypto_key` never leaves the client: it is generated locally at
/// registration time and is never part of any wire payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Login, unique per realm.
    pub login: String,
    /// AES-GCM ciphertext of the plaintext password under `crypto_key`, base64-encoded.
    pub password: String,
    /// Opaque token returned by the server at registration, presented on every
    /// subsequent authenticated request.
    pub token: String,
    /// Raw 16-byte AES-128 key, generated client-side at registration.
    pub crypto_key: Vec<u8>,
    /// Whether this is the one locally "active" user.
    pub active: bool,
}

impl User {
    /// AES-128 key size in bytes.
    pub const KEY_SIZE: usize = 16;
}
