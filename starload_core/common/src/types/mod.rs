use serde::Deserialize;
use std::fmt;

/// SQL flavour the statement catalog renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseDialect {
    /// Amazon Redshift: object storage COPY, distribution and sort keys.
    #[default]
    Redshift,
    /// Plain PostgreSQL. No bulk load from object storage.
    Postgres,
}

impl WarehouseDialect {
    pub fn supports_bulk_load(&self) -> bool {
        matches!(self, WarehouseDialect::Redshift)
    }
}

impl fmt::Display for WarehouseDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarehouseDialect::Redshift => write!(f, "redshift"),
            WarehouseDialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// How `dim_users` is deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDedup {
    /// DISTINCT over every column. A user whose level changed appears once
    /// per level.
    #[default]
    Distinct,
    /// One row per user_id, taken from that user's most recent event.
    LatestLevel,
}

impl fmt::Display for UserDedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserDedup::Distinct => write!(f, "distinct"),
            UserDedup::LatestLevel => write!(f, "latest_level"),
        }
    }
}
