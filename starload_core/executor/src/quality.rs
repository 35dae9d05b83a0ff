//! Read-only checks run against a loaded warehouse.

use crate::error::ExecutorError;
use crate::time_parts::TimeParts;
use catalog::Table;
use shared_clients::AsyncDatabaseAdapter;
use tracing::{info, warn};

const TIME_SAMPLE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityReport {
    /// Rows with a NULL key, per dimension table.
    pub null_keys: Vec<(Table, i64)>,
    /// Fact rows whose song and artist are not both present in staging_songs.
    pub unmatched_fact_rows: i64,
    /// user_id values that occur on more than one dim_users row.
    pub duplicate_user_ids: i64,
    pub time_rows_sampled: usize,
    /// Sampled dim_time rows whose fields disagree with their start_time.
    pub time_mismatches: Vec<String>,
}

impl QualityReport {
    /// Duplicate user ids are a known gap of DISTINCT dedup and do not count.
    pub fn is_clean(&self) -> bool {
        self.null_keys.iter().all(|(_, n)| *n == 0)
            && self.unmatched_fact_rows == 0
            && self.time_mismatches.is_empty()
    }

    pub fn is_strictly_clean(&self) -> bool {
        self.is_clean() && self.duplicate_user_ids == 0
    }

    /// Human readable findings. Duplicate users are listed only when `strict`.
    pub fn problems(&self, strict: bool) -> Vec<String> {
        let mut problems = self
            .null_keys
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(table, n)| format!("{} has {} rows with a NULL key", table, n))
            .collect::<Vec<_>>();
        if self.unmatched_fact_rows > 0 {
            problems.push(format!(
                "fact_songplay has {} rows without a matching song in staging_songs",
                self.unmatched_fact_rows
            ));
        }
        if strict && self.duplicate_user_ids > 0 {
            problems.push(format!(
                "dim_users has {} duplicated user_id values",
                self.duplicate_user_ids
            ));
        }
        problems.extend(self.time_mismatches.iter().cloned());
        problems
    }
}

pub struct QualityChecker;

impl QualityChecker {
    pub async fn run<A>(adapter: &A) -> Result<QualityReport, ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        let mut report = QualityReport::default();

        for table in [Table::DimUsers, Table::DimSongs, Table::DimArtists, Table::DimTime] {
            let key = table.key_column().ok_or_else(|| {
                ExecutorError::unexpected(format!("{} has no key column", table))
            })?;
            let sql = format!("SELECT COUNT(*) FROM {} WHERE {} IS NULL", table, key);
            report.null_keys.push((table, count(adapter, &sql).await?));
        }

        report.unmatched_fact_rows = count(
            adapter,
            "SELECT COUNT(*) FROM fact_songplay f \
             WHERE NOT EXISTS (SELECT 1 FROM staging_songs s \
             WHERE (s.song_id = f.song_id OR (s.song_id IS NULL AND f.song_id IS NULL)) \
             AND (s.artist_id = f.artist_id OR (s.artist_id IS NULL AND f.artist_id IS NULL)))",
        )
        .await?;

        report.duplicate_user_ids = count(
            adapter,
            "SELECT COUNT(*) FROM (SELECT user_id FROM dim_users \
             GROUP BY user_id HAVING COUNT(*) > 1) dup",
        )
        .await?;
        if report.duplicate_user_ids > 0 {
            warn!(
                "dim_users has {} user_id values on more than one row",
                report.duplicate_user_ids
            );
        }

        let sample = adapter
            .query(&format!(
                "SELECT start_time, hour, day, week, month, year, weekday \
                 FROM dim_time ORDER BY start_time LIMIT {}",
                TIME_SAMPLE_SIZE
            ))
            .await?;
        report.time_rows_sampled = sample.len();
        for row in sample {
            let raw = row.get(0).unwrap_or_default();
            let expected = TimeParts::parse_timestamp(raw)
                .map(TimeParts::from_timestamp)
                .ok_or_else(|| {
                    ExecutorError::unexpected(format!("unreadable dim_time start_time '{}'", raw))
                })?;
            let mut actual = Vec::with_capacity(6);
            for idx in 1..=6 {
                actual.push(row.get_i64(idx)?);
            }
            let matches = expected
                .as_row()
                .iter()
                .zip(&actual)
                .all(|(want, got)| Some(*want) == *got);
            if !matches {
                report.time_mismatches.push(format!(
                    "dim_time row {} has {:?}, expected {:?}",
                    raw,
                    actual,
                    expected.as_row()
                ));
            }
        }

        info!(
            "quality checks finished: {} dim_time rows sampled, {} problems",
            report.time_rows_sampled,
            report.problems(true).len()
        );
        Ok(report)
    }
}

async fn count<A>(adapter: &A, sql: &str) -> Result<i64, ExecutorError>
where
    A: AsyncDatabaseAdapter + ?Sized,
{
    let rows = adapter.query(sql).await?;
    rows.first()
        .map(|row| row.get_i64(0))
        .transpose()?
        .flatten()
        .ok_or_else(|| ExecutorError::unexpected(format!("no count returned for: {}", sql)))
}
