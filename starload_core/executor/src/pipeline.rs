use crate::error::ExecutorError;
use crate::loaders::{SchemaManager, StageLoader, TransformLoader};
use crate::report::RunReport;
use crate::state::{RunState, RunStateMachine};
use catalog::StatementCatalog;
use common::config::components::global::WarehouseConfig;
use shared_clients::{create_db_adapter, AsyncDatabaseAdapter, AsyncDbAdapter};
use tracing::{error, info, warn};

/// Open the warehouse session for the active connection profile.
pub async fn connect(config: &WarehouseConfig) -> Result<AsyncDbAdapter, ExecutorError> {
    let details = config
        .get_adapter_connection_details()
        .map_err(|e| ExecutorError::config(e.to_string()))?;
    let adapter = create_db_adapter(details).await?;
    info!("connected to {}", adapter.connection());
    Ok(adapter)
}

/// A full load: optional schema reset, staging load, then transforms.
pub struct Pipeline<'a> {
    catalog: &'a StatementCatalog,
    create_tables: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a StatementCatalog) -> Self {
        Self {
            catalog,
            create_tables: false,
        }
    }

    /// Drop and recreate every table before loading.
    pub fn with_create_tables(mut self, create_tables: bool) -> Self {
        self.create_tables = create_tables;
        self
    }

    /// Run to completion or to the first failure. `report` is filled in
    /// either way, ending in `Done` or `Failed`.
    pub async fn run<A>(&self, adapter: &mut A, report: &mut RunReport) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        let mut machine = RunStateMachine::new();
        match self.drive(adapter, &mut machine, report).await {
            Ok(()) => {
                report.states = machine.history().to_vec();
                report.finish(machine.state(), None);
                report.log_summary();
                Ok(())
            }
            Err(err) => {
                error!("run failed in state {}: {}", machine.state(), err);
                if let Err(e) = machine.fail() {
                    warn!("{}", e);
                }
                report.states = machine.history().to_vec();
                report.finish(RunState::Failed, Some(err.to_string()));
                report.log_summary();
                Err(err)
            }
        }
    }

    async fn drive<A>(
        &self,
        adapter: &mut A,
        machine: &mut RunStateMachine,
        report: &mut RunReport,
    ) -> Result<(), ExecutorError>
    where
        A: AsyncDatabaseAdapter + ?Sized,
    {
        if self.create_tables {
            SchemaManager::new(self.catalog).reset(adapter, report).await?;
        }

        machine.transition(RunState::StagingLoading)?;
        StageLoader::new(self.catalog).load(adapter, report).await?;
        machine.transition(RunState::StagingLoaded)?;

        machine.transition(RunState::Transforming)?;
        TransformLoader::new(self.catalog)
            .transform(adapter, report)
            .await?;
        machine.transition(RunState::Done)?;
        Ok(())
    }
}
