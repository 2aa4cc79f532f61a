//! Local persisted state: a YAML config file plus the SQLite database file
//! it points at, both under `<home>/.goph-keeper/`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

const CONFIG_DIR_NAME: &str = ".goph-keeper";
const CONFIG_FILE_NAME: &str = "client_config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port` (or full `http(s)://...` base URL) of the keeper server.
    pub hostport: String,
    /// SQLite file name, resolved relative to the config directory.
    pub database: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostport: "http://127.0.0.1:8888".to_string(),
            database: "keeper.db".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn config_dir() -> PathBuf {
        PathBuf::from(home_dir()).join(CONFIG_DIR_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn database_path(&self) -> PathBuf {
        Self::config_dir().join(&self.database)
    }

    /// Reads the config file if present; a missing file is not an error --
    /// it yields the default, matching `kvcli`'s `ConfigLoad::new`/`default`
    /// fallback on a missing or unreadable config file.
    pub fn load_or_default() -> Result<Self, CliError> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_yaml::from_str(&contents).map_err(|e| {
                CliError::Operational(format!("parse config file {}, err={e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CliError::Operational(format!(
                "read config file {}, err={e}",
                path.display()
            ))),
        }
    }

    pub fn save(&self) -> Result<(), CliError> {
        let dir = Self::config_dir();
        std::fs::create_dir_all(&dir)
            .map_err(|e| CliError::Operational(format!("create config dir {}, err={e}", dir.display())))?;

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| CliError::Operational(format!("serialize config, err={e}")))?;

        std::fs::write(Self::config_path(), yaml)
            .map_err(|e| CliError::Operational(format!("write config file, err={e}")))
    }
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_both_keys() {
        let config = ClientConfig::default();
        assert!(!config.hostport.is_empty());
        assert!(!config.database.is_empty());
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = ClientConfig {
            hostport: "http://example.invalid:9000".to_string(),
            database: "other.db".to_string(),
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
