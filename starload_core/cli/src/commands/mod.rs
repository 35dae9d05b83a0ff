mod check;
mod compile;
mod create_tables;
mod run;

pub use check::{handle_check, CheckArgs};
pub use compile::{compile_catalog, handle_compile, CompileArgs, PhaseArg};
pub use create_tables::handle_create_tables;
pub use run::{handle_run, RunArgs};

use catalog::{CatalogParams, StatementCatalog};
use common::config::components::global::WarehouseConfig;
use common::config::loader::read_config;
use common::error::LoaderError;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing::info;

/// Read the project config and build its statement catalog.
fn load_project(
    config_path: Option<PathBuf>,
) -> Result<(WarehouseConfig, StatementCatalog), LoaderError> {
    let cfg = read_config(config_path).map_err(LoaderError::init)?;
    info!(
        "project {} v{} ({}, users by {})",
        cfg.project.name,
        cfg.project.version,
        cfg.dialect(),
        cfg.user_dedup()
    );
    let catalog =
        StatementCatalog::build(&CatalogParams::from_config(&cfg)).map_err(LoaderError::compile)?;
    Ok((cfg, catalog))
}

fn runtime() -> Result<Runtime, LoaderError> {
    Runtime::new().map_err(LoaderError::init)
}
