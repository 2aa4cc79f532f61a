//! The `Record` entity: an arbitrary binary/text blob, addressed by name.

use serde::{Deserialize, Serialize};

/// A user-owned record. `data` is always ciphertext on both tiers; plaintext
/// never crosses a store or transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Name, unique per user.
    pub name: String,
    /// Ciphertext (base64), produced by `keeper-crypto`.
    pub data: String,
    /// Monotonic revision counter. Starts at 1.
    pub revision: u64,
}

impl Record {
    /// Revision assigned to a freshly created record.
    pub const INITIAL_REVISION: u64 = 1;

    /// Construct a record about to be created (revision not yet assigned).
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            revision: Self::INITIAL_REVISION,
        }
    }
}
