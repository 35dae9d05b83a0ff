use crate::config::components::connections::{
    AdapterConnectionDetails, Connections, ConnectionsConfig,
};
use crate::config::components::project::WarehouseProjectConfig;
use crate::config::components::sources::ObjectStorageSources;
use crate::config::error::ConfigError;
use crate::types::{UserDedup, WarehouseDialect};

// ---------------- global config ----------------
#[derive(Debug)]
pub struct WarehouseConfig {
    pub project: WarehouseProjectConfig,
    pub connections: ConnectionsConfig,
    pub connection_profile: Connections,
}

impl WarehouseConfig {
    pub fn new(project: WarehouseProjectConfig, connections: ConnectionsConfig) -> Self {
        let connection_profile = project.connection_profile.clone();
        Self {
            project,
            connections,
            connection_profile,
        }
    }

    pub fn dialect(&self) -> WarehouseDialect {
        self.project.dialect
    }

    pub fn user_dedup(&self) -> UserDedup {
        self.project.user_dedup
    }

    pub fn sources(&self) -> &ObjectStorageSources {
        &self.project.sources
    }

    /// Connection details of the warehouse for the active profile.
    pub fn get_adapter_connection_details(&self) -> Result<AdapterConnectionDetails, ConfigError> {
        let profile_name = &self.connection_profile.profile;
        let profile = self.connections.get(profile_name).ok_or_else(|| {
            ConfigError::not_found(format!(
                "connection profile '{}' is not defined, available profiles are {}",
                profile_name,
                sorted_keys(self.connections.keys())
            ))
        })?;

        match &self.connection_profile.target {
            Some(target) => profile.get(target).cloned().ok_or_else(|| {
                ConfigError::not_found(format!(
                    "connection '{}' is not defined in profile '{}', available connections are {}",
                    target,
                    profile_name,
                    sorted_keys(profile.keys())
                ))
            }),
            None if profile.len() == 1 => profile
                .values()
                .next()
                .cloned()
                .ok_or_else(|| ConfigError::not_found(format!("profile '{}' is empty", profile_name))),
            None => Err(ConfigError::not_found(format!(
                "profile '{}' defines {} connections ({}); set connection_profile.target",
                profile_name,
                profile.len(),
                sorted_keys(profile.keys())
            ))),
        }
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let mut keys = keys.map(String::as_str).collect::<Vec<_>>();
    keys.sort_unstable();
    keys.join(", ")
}
