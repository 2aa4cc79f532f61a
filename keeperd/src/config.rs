//! Daemon configuration, loaded from environment variables.
//!
//! One struct, one `from_env` constructor; `dotenvy::dotenv()` loaded
//! first and its absence ignored.

use std::env;

use crate::error::{DaemonError, DaemonResult};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// PostgreSQL connection string. Required when the `postgres` feature
    /// is compiled in; ignored (an in-memory store is used instead) otherwise.
    pub database_url: Option<String>,
    /// Raw 16-byte AES-128 key used to mint tokens. Deterministic on
    /// purpose -- see the crate-level docs; a fixed default is used when
    /// `KEEPER_SERVER_KEY` is unset.
    pub server_key: Vec<u8>,
}

/// The well-known default key, used when `KEEPER_SERVER_KEY` is unset.
/// Deliberately not random: token derivation must be stable across daemon
/// restarts without requiring operators to manage a secret.
const DEFAULT_SERVER_KEY: [u8; 16] = *b"keeperd-dev-key!";

impl Config {
    pub fn from_env() -> DaemonResult<Self> {
        let _ = dotenvy::dotenv();

        let host = env::var("KEEPER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("KEEPER_PORT")
            .unwrap_or_else(|_| "8888".to_string())
            .parse::<u16>()
            .map_err(|_| DaemonError::Config("invalid KEEPER_PORT".to_string()))?;

        let database_url = env::var("DATABASE_URL").ok();

        let server_key = match env::var("KEEPER_SERVER_KEY") {
            Ok(b64) => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD_NO_PAD
                    .decode(b64.trim())
                    .map_err(|_| DaemonError::Config("KEEPER_SERVER_KEY is not valid base64".to_string()))?
            }
            Err(_) => DEFAULT_SERVER_KEY.to_vec(),
        };

        Ok(Self {
            host,
            port,
            database_url,
            server_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_is_sixteen_bytes() {
        assert_eq!(DEFAULT_SERVER_KEY.len(), keeper_crypto::KEY_SIZE);
    }
}
