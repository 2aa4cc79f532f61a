use keeper_domain::KeeperError;
use thiserror::Error;

/// Errors surfaced by [`crate::Client`]. Status codes are translated per
/// §4.4; transport-level failures (the only thing worth retrying) keep
/// their own variant so callers can tell the two apart.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("server returned status {0}")]
    Http(u16),

    #[error("network error after retries: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<TransportError> for KeeperError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotFound => KeeperError::NotFound("remote".to_string()),
            TransportError::Conflict => KeeperError::AlreadyExists("remote".to_string()),
            TransportError::Unauthorized => KeeperError::UnknownUser,
            other => KeeperError::Transport(other.to_string()),
        }
    }
}
