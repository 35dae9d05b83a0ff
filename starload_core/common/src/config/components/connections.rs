use crate::config::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

///  ---------------- Connections Config ----------------
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseAdapterType {
    Postgres,
    /// Redshift speaks the Postgres wire protocol.
    Redshift,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AdapterConnectionDetails {
    pub host: String,
    pub user: String,
    pub database: String,
    pub password: String,
    pub port: String,
    pub adapter_type: DatabaseAdapterType,
}

impl AdapterConnectionDetails {
    pub fn new(
        host: &str,
        user: &str,
        database: &str,
        password: &str,
        port: &str,
        adapter_type: DatabaseAdapterType,
    ) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            database: database.to_string(),
            password: password.to_string(),
            port: port.to_string(),
            adapter_type,
        }
    }

    pub fn port_number(&self) -> Result<u16, ConfigError> {
        self.port
            .parse::<u16>()
            .map_err(|e| ConfigError::invalid_value("port", format!("'{}': {e}", self.port)))
    }
}

/// Map of connection profiles (e.g. `dev`) to named connections.
pub type ConnectionsConfig = HashMap<String, HashMap<String, AdapterConnectionDetails>>;

/// `connection_profile` block of the project file.
#[derive(Debug, Deserialize, Clone)]
pub struct Connections {
    pub profile: String,
    pub path: PathBuf,
    /// Connection to use inside the profile. May be omitted when the
    /// profile holds exactly one connection.
    #[serde(default)]
    pub target: Option<String>,
}
