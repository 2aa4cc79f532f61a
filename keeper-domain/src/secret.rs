//! The `Secret` entity: an arbitrary key/value pair, addressed by name.

use serde::{Deserialize, Serialize};

/// A user-owned secret, as the caller thinks of it. `name` is the plaintext
/// address (unique per user, never encrypted -- it has to be queryable);
/// `key`/`value` are the sensitive pair and only ever exist encrypted
/// together as [`SecretPayload`] once they cross a store or transport
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub key: String,
    pub value: String,
}

impl Secret {
    pub fn new(name: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Split into the addressing name and the part that gets encrypted.
    pub fn into_parts(self) -> (String, SecretPayload) {
        (
            self.name,
            SecretPayload {
                key: self.key,
                value: self.value,
            },
        )
    }

    /// Reassemble from an addressing name and a decrypted payload.
    pub fn from_parts(name: impl Into<String>, payload: SecretPayload) -> Self {
        Self {
            name: name.into(),
            key: payload.key,
            value: payload.value,
        }
    }
}

/// The part of a [`Secret`] that is JSON-encoded and AES-GCM-encrypted into
/// a [`StoredSecret::data`] / wire `data` field. `name` never appears here:
/// it stays plaintext everywhere, since every tier needs it to address the
/// row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretPayload {
    pub key: String,
    pub value: String,
}

/// A stored secret: `data` is the AES-GCM ciphertext (base64) of the JSON
/// encoding of [`SecretPayload`]. This is the shape held by both stores and
/// carried on the wire; [`Secret`] only exists after decryption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSecret {
    pub name: String,
    pub data: String,
}
