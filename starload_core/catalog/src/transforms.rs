//! INSERT ... SELECT statements that build the star schema from staging.
//!
//! Every statement reads staging tables only, so they can run in any order
//! once staging is loaded. Dimension inserts filter null keys before the
//! DISTINCT projection.

use crate::schema::Table;
use common::types::{UserDedup, WarehouseDialect};

/// Plays resolved against the song catalog. The inner join drops events
/// without an (artist, title) match.
const SONGPLAY_INSERT: &str = "\
INSERT INTO fact_songplay (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT DISTINCT
    e.ts,
    e.userId,
    e.level,
    s.song_id,
    s.artist_id,
    e.sessionId,
    s.artist_location,
    e.userAgent
FROM staging_events e
JOIN staging_songs s
ON (e.artist = s.artist_name) AND (e.song = s.title)";

const USER_INSERT_DISTINCT: &str = "\
INSERT INTO dim_users (user_id, first_name, last_name, gender, level)
SELECT DISTINCT
    userId,
    firstName,
    lastName,
    gender,
    level
FROM staging_events
WHERE userId IS NOT NULL";

const USER_INSERT_LATEST_LEVEL: &str = "\
INSERT INTO dim_users (user_id, first_name, last_name, gender, level)
SELECT
    user_id,
    first_name,
    last_name,
    gender,
    level
FROM (
    SELECT
        userId    AS user_id,
        firstName AS first_name,
        lastName  AS last_name,
        gender,
        level,
        ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC NULLS LAST, level) AS recency
    FROM staging_events
    WHERE userId IS NOT NULL
) ranked
WHERE recency = 1";

const SONG_INSERT: &str = "\
INSERT INTO dim_songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs
WHERE song_id IS NOT NULL";

const ARTIST_INSERT: &str = "\
INSERT INTO dim_artists (artist_id, name, location, latitude, longitude)
SELECT DISTINCT
    artist_id,
    artist_name,
    artist_location,
    artist_latitude,
    artist_longitude
FROM staging_songs
WHERE artist_id IS NOT NULL";

/// Day-of-week field name. Both number Sunday as 0.
fn weekday_field(dialect: WarehouseDialect) -> &'static str {
    match dialect {
        WarehouseDialect::Redshift => "WEEKDAY",
        WarehouseDialect::Postgres => "DOW",
    }
}

fn time_insert(dialect: WarehouseDialect) -> String {
    format!(
        "\
INSERT INTO dim_time (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT
    ts,
    EXTRACT(HOUR FROM ts),
    EXTRACT(DAY FROM ts),
    EXTRACT(WEEK FROM ts),
    EXTRACT(MONTH FROM ts),
    EXTRACT(YEAR FROM ts),
    EXTRACT({} FROM ts)
FROM staging_events
WHERE ts IS NOT NULL",
        weekday_field(dialect)
    )
}

/// One rendered transform: target, the staging tables it reads, its SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    pub target: Table,
    pub reads: Vec<Table>,
    pub sql: String,
}

impl TransformSpec {
    fn new(target: Table, reads: &[Table], sql: impl Into<String>) -> Self {
        Self {
            target,
            reads: reads.to_vec(),
            sql: sql.into(),
        }
    }
}

/// The five transforms, fact table first.
pub fn transforms(dialect: WarehouseDialect, user_dedup: UserDedup) -> Vec<TransformSpec> {
    let user_insert = match user_dedup {
        UserDedup::Distinct => USER_INSERT_DISTINCT,
        UserDedup::LatestLevel => USER_INSERT_LATEST_LEVEL,
    };
    vec![
        TransformSpec::new(
            Table::FactSongplay,
            &[Table::StagingEvents, Table::StagingSongs],
            SONGPLAY_INSERT,
        ),
        TransformSpec::new(Table::DimUsers, &[Table::StagingEvents], user_insert),
        TransformSpec::new(Table::DimSongs, &[Table::StagingSongs], SONG_INSERT),
        TransformSpec::new(Table::DimArtists, &[Table::StagingSongs], ARTIST_INSERT),
        TransformSpec::new(Table::DimTime, &[Table::StagingEvents], time_insert(dialect)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_transforms_fact_first() {
        let specs = transforms(WarehouseDialect::Redshift, UserDedup::Distinct);
        let targets = specs.iter().map(|s| s.target).collect::<Vec<_>>();
        assert_eq!(targets, Table::STAR.to_vec());
        for spec in &specs {
            assert!(spec.sql.starts_with(&format!("INSERT INTO {} (", spec.target)));
            assert!(spec.reads.iter().all(Table::is_staging));
        }
    }

    #[test]
    fn dimension_inserts_filter_null_keys_and_dedup() {
        for spec in transforms(WarehouseDialect::Redshift, UserDedup::Distinct) {
            if spec.target == Table::FactSongplay {
                assert!(spec.sql.contains("JOIN staging_songs s"));
                continue;
            }
            assert!(spec.sql.contains("SELECT DISTINCT"), "{}", spec.sql);
            assert!(spec.sql.contains("IS NOT NULL"), "{}", spec.sql);
        }
    }

    #[test]
    fn fact_join_matches_artist_and_title() {
        let specs = transforms(WarehouseDialect::Postgres, UserDedup::Distinct);
        let fact = &specs[0];
        assert!(fact.sql.contains("ON (e.artist = s.artist_name) AND (e.song = s.title)"));
        assert!(!fact.sql.contains("LEFT JOIN"));
    }

    #[test]
    fn weekday_extraction_follows_dialect() {
        let redshift = time_insert(WarehouseDialect::Redshift);
        assert!(redshift.contains("EXTRACT(WEEKDAY FROM ts)"));
        let postgres = time_insert(WarehouseDialect::Postgres);
        assert!(postgres.contains("EXTRACT(DOW FROM ts)"));
    }

    #[test]
    fn latest_level_keeps_one_row_per_user() {
        let specs = transforms(WarehouseDialect::Redshift, UserDedup::LatestLevel);
        let users = specs.iter().find(|s| s.target == Table::DimUsers).unwrap();
        assert!(users.sql.contains("PARTITION BY userId ORDER BY ts DESC"));
        assert!(users.sql.contains("WHERE recency = 1"));
        assert!(users.sql.contains("WHERE userId IS NOT NULL"));
    }
}
