//! CLI-facing error type. Maps every lower-tier error into one of two
//! exit-code buckets: validation failures (1) and operational failures
//! (anything else, non-zero). Message formatting is a single line
//! prefixed with context -- no stack traces.

use std::fmt;

use keeper_actions::ActionError;
use keeper_domain::KeeperError;

#[derive(Debug)]
pub enum CliError {
    Validation(String),
    Operational(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation(_) => 1,
            CliError::Operational(_) => 2,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Validation(msg) => write!(f, "{msg}"),
            CliError::Operational(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ActionError> for CliError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Validation(msg) => CliError::Validation(msg),
            other => CliError::Operational(other.to_string()),
        }
    }
}

impl From<KeeperError> for CliError {
    fn from(err: KeeperError) -> Self {
        match err {
            KeeperError::Validation(msg) => CliError::Validation(msg),
            other => CliError::Operational(other.to_string()),
        }
    }
}
