//! Daemon-level errors: configuration and startup failures only. Request
//! handling errors are `keeper_server::ServerError`'s job.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] keeper_crypto::CryptoError),
}

pub type DaemonResult<T> = Result<T, DaemonError>;
