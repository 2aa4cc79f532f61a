//! Cross-cutting error taxonomy.
//!
//! Every tier of the system (local store, remote store, transport, action
//! orchestration) surfaces one of these kinds, per the error-handling design.
//! Individual crates wrap this in their own `thiserror` enum and convert with
//! `#[from]`, rather than reusing `KeeperError` as a god-type.

use thiserror::Error;

/// The shared error kinds surfaced by every tier of the system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeeperError {
    /// Item not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on create.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Update against a stale revision.
    #[error("bad revision: expected {expected}, got {actual}")]
    BadRevision {
        /// Revision the server currently holds.
        expected: u64,
        /// Revision the caller supplied.
        actual: u64,
    },

    /// Token did not resolve to a user.
    #[error("unknown user")]
    UnknownUser,

    /// Registration found an existing login with a different password.
    #[error("bad password")]
    BadPassword,

    /// Malformed request fields (missing keys, bad card format, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure after retries exhausted.
    #[error("transport error: {0}")]
    Transport(String),

    /// No local user is active (none registered, or all inactive).
    #[error("no active user")]
    NoActiveUser,

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}
