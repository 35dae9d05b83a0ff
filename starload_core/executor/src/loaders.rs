//! Sequential statement runners for the schema, load and transform phases.
//!
//! Each statement is sent on its own and committed before the next one
//! starts. The first failure stops the phase; nothing already committed is
//! rolled back, and its timing stays in the report.

use crate::error::ExecutorError;
use crate::report::{RunReport, StatementTiming};
use catalog::{StatementCatalog, StatementDescriptor};
use logging::timeit;
use shared_clients::AsyncDatabaseAdapter;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Execute one statement and time it. Adapter errors are tagged with the
/// statement's phase and target.
pub async fn run_statement<A>(
    adapter: &mut A,
    statement: &StatementDescriptor,
) -> Result<StatementTiming, ExecutorError>
where
    A: AsyncDatabaseAdapter + ?Sized,
{
    debug!("{}:\n{}", statement.label(), statement.sql);
    let start = Instant::now();
    adapter
        .execute(&statement.sql)
        .await
        .map_err(|e| ExecutorError::statement_failed(statement, e))?;
    let elapsed = start.elapsed();
    debug!("{} committed in {:.2?}", statement.label(), elapsed);
    Ok(StatementTiming::new(statement, elapsed))
}

/// Records each statement as soon as it commits.
async fn run_all<'a, A, I>(
    adapter: &mut A,
    statements: I,
    report: &mut RunReport,
) -> Result<(), ExecutorError>
where
    A: AsyncDatabaseAdapter + ?Sized,
    I: IntoIterator<Item = &'a StatementDescriptor>,
{
    for statement in statements {
        report.record(run_statement(adapter, statement).await?);
    }
    Ok(())
}

/// Fills the staging tables with the catalog's COPY statements.
pub struct StageLoader<'a> {
    catalog: &'a StatementCatalog,
}

impl<'a> StageLoader<'a> {
    pub fn new(catalog: &'a StatementCatalog) -> Self {
        Self { catalog }
    }

    pub async fn load<A>(&self, adapter: &mut A, report: &mut RunReport) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        if self.catalog.bulk_loads().next().is_none() {
            warn!(
                "no bulk loads for dialect '{}', staging tables are used as they are",
                self.catalog.dialect()
            );
            return Ok(());
        }
        info!("Loading staging tables");
        timeit!("Loaded staging tables", {
            run_all(adapter, self.catalog.bulk_loads(), report).await
        })
    }
}

/// Builds the fact and dimension tables from staging.
pub struct TransformLoader<'a> {
    catalog: &'a StatementCatalog,
}

impl<'a> TransformLoader<'a> {
    pub fn new(catalog: &'a StatementCatalog) -> Self {
        Self { catalog }
    }

    pub async fn transform<A>(
        &self,
        adapter: &mut A,
        report: &mut RunReport,
    ) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        info!("Transforming staging into the star schema");
        timeit!("Transformed staging tables", {
            run_all(adapter, self.catalog.transforms(), report).await
        })
    }
}

/// Drops and recreates every table.
pub struct SchemaManager<'a> {
    catalog: &'a StatementCatalog,
}

impl<'a> SchemaManager<'a> {
    pub fn new(catalog: &'a StatementCatalog) -> Self {
        Self { catalog }
    }

    pub async fn drop_tables<A>(
        &self,
        adapter: &mut A,
        report: &mut RunReport,
    ) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        run_all(adapter, self.catalog.drops(), report).await
    }

    pub async fn create_tables<A>(
        &self,
        adapter: &mut A,
        report: &mut RunReport,
    ) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        run_all(adapter, self.catalog.creates(), report).await
    }

    /// `drop_tables` followed by `create_tables`.
    pub async fn reset<A>(&self, adapter: &mut A, report: &mut RunReport) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        timeit!("Recreated tables", {
            self.drop_tables(adapter, report).await?;
            self.create_tables(adapter, report).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogParams, Phase, Table};
    use common::config::components::sources::ObjectStorageSources;
    use common::types::{UserDedup, WarehouseDialect};
    use test_utils::RecordingAdapter;

    fn redshift_catalog() -> StatementCatalog {
        StatementCatalog::build(&CatalogParams {
            dialect: WarehouseDialect::Redshift,
            user_dedup: UserDedup::Distinct,
            sources: Some(ObjectStorageSources {
                log_data: "s3://udacity-dend/log_data".into(),
                log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
                song_data: "s3://udacity-dend/song_data".into(),
                iam_role: "arn:aws:iam::123456789012:role/dwhRole".into(),
                region: "us-west-2".into(),
            }),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn stage_loader_copies_events_then_songs() {
        let catalog = redshift_catalog();
        let mut adapter = RecordingAdapter::default();
        let mut report = RunReport::new();

        StageLoader::new(&catalog)
            .load(&mut adapter, &mut report)
            .await
            .unwrap();

        assert_eq!(adapter.executed.len(), 2);
        assert!(adapter.executed[0].starts_with("COPY staging_events"));
        assert!(adapter.executed[1].starts_with("COPY staging_songs"));
        assert_eq!(report.phase(Phase::Load).count(), 2);
    }

    #[tokio::test]
    async fn transform_failure_keeps_committed_timings() {
        let catalog = redshift_catalog();
        let mut adapter = RecordingAdapter::default()
            .failing_on("INSERT INTO dim_songs", "column \"year\" is of type integer");
        let mut report = RunReport::new();

        let err = TransformLoader::new(&catalog)
            .transform(&mut adapter, &mut report)
            .await
            .unwrap_err();

        match &err {
            ExecutorError::StatementFailed { phase, target, .. } => {
                assert_eq!(*phase, Phase::Transform);
                assert_eq!(*target, Table::DimSongs);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("column \"year\" is of type integer"));
        // fact, users, then the failing songs insert; artists and time never run
        assert_eq!(adapter.executed.len(), 3);
        assert!(!adapter
            .executed
            .iter()
            .any(|sql| sql.starts_with("INSERT INTO dim_artists")));

        let committed = report
            .phase(Phase::Transform)
            .map(|t| t.target.as_str())
            .collect::<Vec<_>>();
        assert_eq!(committed, vec!["fact_songplay", "dim_users"]);
    }

    #[tokio::test]
    async fn schema_reset_drops_before_creating() {
        let catalog = redshift_catalog();
        let mut adapter = RecordingAdapter::default();
        let mut report = RunReport::new();

        SchemaManager::new(&catalog)
            .reset(&mut adapter, &mut report)
            .await
            .unwrap();

        assert_eq!(report.phase(Phase::Drop).count(), 7);
        assert_eq!(report.phase(Phase::Create).count(), 7);
        assert!(adapter.executed[..7]
            .iter()
            .all(|sql| sql.starts_with("DROP TABLE IF EXISTS")));
        assert!(adapter.executed[7..]
            .iter()
            .all(|sql| sql.starts_with("CREATE TABLE")));
        assert_eq!(adapter.executed[7], Table::StagingEvents.create_sql(WarehouseDialect::Redshift));
    }

    #[tokio::test]
    async fn postgres_catalog_has_nothing_to_load() {
        let catalog = StatementCatalog::build(&CatalogParams {
            dialect: WarehouseDialect::Postgres,
            user_dedup: UserDedup::Distinct,
            sources: None,
        })
        .unwrap();
        let mut adapter = RecordingAdapter::default();
        let mut report = RunReport::new();

        StageLoader::new(&catalog)
            .load(&mut adapter, &mut report)
            .await
            .unwrap();
        assert!(report.statements.is_empty());
        assert!(adapter.executed.is_empty());
    }
}
