//! Core domain types shared by every other crate: entities, validation and
//! the cross-cutting error taxonomy. No I/O, no crypto, no serialization
//! beyond `serde` derives.

mod card;
mod error;
mod record;
mod secret;
mod user;

pub use card::{BankCardPlaintext, Card, CardExpiry};
pub use error::KeeperError;
pub use record::Record;
pub use secret::{Secret, SecretPayload, StoredSecret};
pub use user::User;
