use crate::config::components::connections::{
    AdapterConnectionDetails, ConnectionsConfig, DatabaseAdapterType,
};
use crate::config::components::global::WarehouseConfig;
use crate::config::components::project::WarehouseProjectConfig;
use crate::config::error::ConfigError;
use crate::config::PROJECT_FILE_NAME;
use serde::de::Error;
use serde::Deserialize;
use serde_yaml::{self, Error as YamlError, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load the project file and its connection profiles.
///
/// `project_config_path` is the directory holding `warehouse-project.yml`;
/// the current directory is used when it is `None`. Relative paths inside
/// the project file resolve against that directory.
pub fn read_config(project_config_path: Option<PathBuf>) -> Result<WarehouseConfig, ConfigError> {
    let proj_config_file_path = match project_config_path {
        Some(dir) => dir.join(PROJECT_FILE_NAME),
        None => PathBuf::from(PROJECT_FILE_NAME),
    };
    if !proj_config_file_path.exists() {
        return Err(ConfigError::incorrect_path(&proj_config_file_path));
    }

    debug!("loading project config from {}", proj_config_file_path.display());
    let project_file = fs::File::open(&proj_config_file_path)?;
    let proj_config: WarehouseProjectConfig = serde_yaml::from_reader(project_file)?;
    proj_config.sources.validate()?;

    let config_root = proj_config_file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let connections_path = resolve_path(&config_root, &proj_config.connection_profile.path);
    if !connections_path.exists() {
        return Err(ConfigError::missing_connection(&connections_path));
    }
    debug!("loading connections from {}", connections_path.display());
    let conn_file = fs::File::open(&connections_path)?;
    let raw_connections: HashMap<String, Value> = serde_yaml::from_reader(conn_file)?;

    let mut connections: ConnectionsConfig = HashMap::new();
    for (profile, value) in raw_connections.into_iter() {
        let profile_connections = parse_connection_profile(value)
            .map_err(|err| ConfigError::parse_error(format!("profile {}: {}", profile, err)))?;
        connections.insert(profile, profile_connections);
    }

    Ok(WarehouseConfig::new(proj_config, connections))
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn parse_connection_profile(
    value: Value,
) -> Result<HashMap<String, AdapterConnectionDetails>, YamlError> {
    // A profile is either a single connection or a map of named ones.
    if let Ok(single) = serde_yaml::from_value::<RawConnectionDetails>(value.clone()) {
        let mut map = HashMap::new();
        map.insert("default".to_string(), single.into_adapter_details()?);
        return Ok(map);
    }

    let nested: HashMap<String, RawConnectionDetails> = serde_yaml::from_value(value)?;
    nested
        .into_iter()
        .map(|(name, raw)| Ok((name, raw.into_adapter_details()?)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawConnectionDetails {
    #[serde(default)]
    adapter: Option<DatabaseAdapterType>,
    #[serde(default)]
    adapter_type: Option<DatabaseAdapterType>,
    host: String,
    user: String,
    database: String,
    password: String,
    #[serde(deserialize_with = "deserialize_port_to_string")]
    port: String,
}

impl RawConnectionDetails {
    fn into_adapter_details(self) -> Result<AdapterConnectionDetails, YamlError> {
        let adapter_type = self
            .adapter_type
            .or(self.adapter)
            .ok_or_else(|| YamlError::custom("missing `adapter` or `adapter_type`"))?;

        Ok(AdapterConnectionDetails::new(
            &self.host,
            &self.user,
            &self.database,
            &self.password,
            &self.port,
            adapter_type,
        ))
    }
}

fn deserialize_port_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> serde::de::Visitor<'de> for PortVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer port value")
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Self::Value, E> {
            if value < 0 {
                return Err(E::custom("port cannot be negative"));
            }
            Ok(value.to_string())
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value.to_owned())
        }
    }

    deserializer.deserialize_any(PortVisitor)
}
