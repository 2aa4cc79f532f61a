//! Both tiers of persistence (§4.2/§4.3): a [`LocalStore`] (SQLite, client)
//! and a [`RemoteStore`] (PostgreSQL, server), each a narrow capability
//! trait rather than one combined interface, so `keeper-actions` and
//! `keeper-server` only depend on what they actually call.

mod error;
mod local;
mod remote;

pub use error::StoreError;
pub use local::{LocalStore, SqliteLocalStore};
#[cfg(feature = "postgres")]
pub use remote::PgRemoteStore;
pub use remote::{MemoryRemoteStore, RemoteStore};
