use crate::config::components::connections::Connections;
use crate::config::components::sources::ObjectStorageSources;
use crate::types::{UserDedup, WarehouseDialect};
use serde::Deserialize;

// ---------------- Warehouse Project Config ----------------
#[derive(Debug, Deserialize)]
pub struct WarehouseProjectConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dialect: WarehouseDialect,
    #[serde(default)]
    pub user_dedup: UserDedup,
    pub connection_profile: Connections,
    pub sources: ObjectStorageSources,
}
