//! Star schema table definitions and their DDL.

use common::types::WarehouseDialect;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Raw, undeduplicated rows copied from object storage.
    Staging,
    Fact,
    Dimension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    StagingEvents,
    StagingSongs,
    FactSongplay,
    DimUsers,
    DimSongs,
    DimArtists,
    DimTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Integer,
    BigInt,
    Float,
    Timestamp,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Varchar => "VARCHAR",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Float => "FLOAT",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Column attributes beyond the type. Redshift treats keys as planner
/// hints and never enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    /// Surrogate key counting up from zero.
    Identity,
    PrimaryKey,
    DistKey,
    SortKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub constraints: &'static [ColumnConstraint],
}

const fn col(name: &'static str, sql_type: SqlType) -> Column {
    Column {
        name,
        sql_type,
        constraints: &[],
    }
}

const fn keyed(
    name: &'static str,
    sql_type: SqlType,
    constraints: &'static [ColumnConstraint],
) -> Column {
    Column {
        name,
        sql_type,
        constraints,
    }
}

use ColumnConstraint::*;
use SqlType::*;

const STAGING_EVENTS: &[Column] = &[
    col("artist", Varchar),
    col("auth", Varchar),
    col("firstName", Varchar),
    col("gender", Varchar),
    col("itemInSession", Integer),
    col("lastName", Varchar),
    col("length", Float),
    col("level", Varchar),
    col("location", Varchar),
    col("method", Varchar),
    col("page", Varchar),
    col("registration", BigInt),
    col("sessionId", Integer),
    col("song", Varchar),
    col("status", Integer),
    col("ts", Timestamp),
    col("userAgent", Varchar),
    col("userId", Integer),
];

const STAGING_SONGS: &[Column] = &[
    col("song_id", Varchar),
    col("num_songs", Integer),
    col("title", Varchar),
    col("artist_name", Varchar),
    col("artist_latitude", Float),
    col("year", Integer),
    col("duration", Float),
    col("artist_id", Varchar),
    col("artist_longitude", Float),
    col("artist_location", Varchar),
];

const FACT_SONGPLAY: &[Column] = &[
    keyed("songplay_id", Integer, &[Identity, PrimaryKey]),
    col("start_time", Timestamp),
    col("user_id", Varchar),
    col("level", Varchar),
    col("song_id", Varchar),
    col("artist_id", Varchar),
    col("session_id", Integer),
    col("location", Varchar),
    col("user_agent", Varchar),
];

const DIM_USERS: &[Column] = &[
    keyed("user_id", Varchar, &[PrimaryKey]),
    col("first_name", Varchar),
    col("last_name", Varchar),
    col("gender", Varchar),
    col("level", Varchar),
];

const DIM_SONGS: &[Column] = &[
    keyed("song_id", Varchar, &[PrimaryKey]),
    col("title", Varchar),
    keyed("artist_id", Varchar, &[DistKey]),
    col("year", Integer),
    col("duration", Float),
];

const DIM_ARTISTS: &[Column] = &[
    keyed("artist_id", Varchar, &[PrimaryKey]),
    col("name", Varchar),
    keyed("location", Varchar, &[DistKey]),
    col("latitude", Float),
    col("longitude", Float),
];

const DIM_TIME: &[Column] = &[
    keyed("start_time", Timestamp, &[PrimaryKey, SortKey]),
    col("hour", Integer),
    col("day", Integer),
    col("week", Integer),
    col("month", Integer),
    col("year", Integer),
    col("weekday", Integer),
];

impl Table {
    /// Every table, staging first, then the fact table, then dimensions.
    pub const ALL: [Table; 7] = [
        Table::StagingEvents,
        Table::StagingSongs,
        Table::FactSongplay,
        Table::DimUsers,
        Table::DimSongs,
        Table::DimArtists,
        Table::DimTime,
    ];

    pub const STAGING: [Table; 2] = [Table::StagingEvents, Table::StagingSongs];

    /// Fact first, then dimensions; the order transforms run in.
    pub const STAR: [Table; 5] = [
        Table::FactSongplay,
        Table::DimUsers,
        Table::DimSongs,
        Table::DimArtists,
        Table::DimTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::StagingEvents => "staging_events",
            Table::StagingSongs => "staging_songs",
            Table::FactSongplay => "fact_songplay",
            Table::DimUsers => "dim_users",
            Table::DimSongs => "dim_songs",
            Table::DimArtists => "dim_artists",
            Table::DimTime => "dim_time",
        }
    }

    pub fn kind(&self) -> TableKind {
        match self {
            Table::StagingEvents | Table::StagingSongs => TableKind::Staging,
            Table::FactSongplay => TableKind::Fact,
            _ => TableKind::Dimension,
        }
    }

    pub fn is_staging(&self) -> bool {
        self.kind() == TableKind::Staging
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Table::StagingEvents => STAGING_EVENTS,
            Table::StagingSongs => STAGING_SONGS,
            Table::FactSongplay => FACT_SONGPLAY,
            Table::DimUsers => DIM_USERS,
            Table::DimSongs => DIM_SONGS,
            Table::DimArtists => DIM_ARTISTS,
            Table::DimTime => DIM_TIME,
        }
    }

    /// Primary key column, if the table has one.
    pub fn key_column(&self) -> Option<&'static str> {
        self.columns()
            .iter()
            .find(|c| c.constraints.contains(&PrimaryKey))
            .map(|c| c.name)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name())
    }

    pub fn create_sql(&self, dialect: WarehouseDialect) -> String {
        let width = self
            .columns()
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0);
        let columns = self
            .columns()
            .iter()
            .map(|c| format!("    {}", render_column(c, width, dialect)))
            .collect::<Vec<_>>()
            .join(",\n");

        let mut sql = format!("CREATE TABLE {}\n(\n{}\n)", self.name(), columns);
        if dialect == WarehouseDialect::Redshift && *self == Table::DimUsers {
            sql.push_str("\nDISTSTYLE ALL");
        }
        sql
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn render_column(column: &Column, width: usize, dialect: WarehouseDialect) -> String {
    let mut parts = vec![format!("{:<width$} {}", column.name, column.sql_type.as_sql())];
    let identity = column.constraints.contains(&Identity);
    for constraint in column.constraints {
        let rendered = match (dialect, constraint) {
            (WarehouseDialect::Redshift, Identity) => Some("IDENTITY(0,1)"),
            (WarehouseDialect::Postgres, Identity) => {
                Some("GENERATED BY DEFAULT AS IDENTITY (START WITH 0 MINVALUE 0)")
            }
            (WarehouseDialect::Redshift, PrimaryKey) => Some("PRIMARY KEY"),
            // Postgres would enforce natural keys that Redshift only records;
            // keep the surrogate key, drop the rest so both accept the same rows.
            (WarehouseDialect::Postgres, PrimaryKey) if identity => Some("PRIMARY KEY"),
            (WarehouseDialect::Postgres, PrimaryKey) => None,
            (WarehouseDialect::Redshift, DistKey) => Some("DISTKEY"),
            (WarehouseDialect::Redshift, SortKey) => Some("SORTKEY"),
            (WarehouseDialect::Postgres, DistKey | SortKey) => None,
        };
        if let Some(rendered) = rendered {
            parts.push(rendered.to_string());
        }
    }
    parts.join(" ").trim_end().to_string()
}
