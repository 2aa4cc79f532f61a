//! Errors surfaced by the action layer. Every leaf error (crypto, local
//! store, transport) converts into one of these so the CLI only has to
//! match on one enum.

use keeper_crypto::CryptoError;
use keeper_domain::KeeperError;
use keeper_store::StoreError;
use keeper_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("bad revision: expected {expected}, got {actual}")]
    BadRevision { expected: u64, actual: u64 },

    #[error("no active user, run register first")]
    NoActiveUser,

    #[error("bad password")]
    BadPassword,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ActionError::NotFound(id),
            StoreError::AlreadyExists(id) => ActionError::AlreadyExists(id),
            StoreError::BadRevision { expected, actual } => {
                ActionError::BadRevision { expected, actual }
            }
            StoreError::UnknownUser => ActionError::NoActiveUser,
            StoreError::BadPassword => ActionError::BadPassword,
            StoreError::NoActiveUser => ActionError::NoActiveUser,
            StoreError::Database(msg) | StoreError::Connection(msg) | StoreError::Serialization(msg) => {
                ActionError::Internal(msg)
            }
        }
    }
}

impl From<ActionError> for KeeperError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::NotFound(id) => KeeperError::NotFound(id),
            ActionError::AlreadyExists(id) => KeeperError::AlreadyExists(id),
            ActionError::BadRevision { expected, actual } => {
                KeeperError::BadRevision { expected, actual }
            }
            ActionError::NoActiveUser => KeeperError::NoActiveUser,
            ActionError::BadPassword => KeeperError::BadPassword,
            ActionError::Validation(msg) => KeeperError::Validation(msg),
            ActionError::Crypto(e) => KeeperError::Internal(e.to_string()),
            ActionError::Transport(e) => KeeperError::Transport(e.to_string()),
            ActionError::Internal(msg) => KeeperError::Internal(msg),
        }
    }
}
