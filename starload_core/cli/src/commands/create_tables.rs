use super::{load_project, runtime};
use catalog::Phase;
use common::error::LoaderError;
use executor::{connect, RunReport, SchemaManager};
use std::path::PathBuf;
use tracing::info;

pub fn handle_create_tables(config_path: Option<PathBuf>) -> Result<(), LoaderError> {
    let (cfg, catalog) = load_project(config_path)?;
    let mut report = RunReport::new();
    runtime()?
        .block_on(async {
            let mut adapter = connect(&cfg).await?;
            SchemaManager::new(&catalog)
                .reset(&mut *adapter, &mut report)
                .await
        })
        .map_err(LoaderError::run)?;
    info!("recreated {} tables", report.phase(Phase::Create).count());
    Ok(())
}
