use super::{load_project, runtime};
use clap::Args;
use common::error::LoaderError;
use executor::{connect, Pipeline, RunReport};
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Drop and recreate every table before loading
    #[arg(long)]
    pub create_tables: bool,
    /// Write the run report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

pub fn handle_run(args: &RunArgs, config_path: Option<PathBuf>) -> Result<(), LoaderError> {
    let (cfg, catalog) = load_project(config_path)?;
    let mut report = RunReport::new();

    let result = runtime()?.block_on(async {
        let mut adapter = connect(&cfg).await?;
        Pipeline::new(&catalog)
            .with_create_tables(args.create_tables)
            .run(&mut *adapter, &mut report)
            .await
    });
    if let Err(e) = &result {
        // a failed connect never reaches the pipeline, which finishes the report otherwise
        report.fail_unfinished(e);
    }

    if let Some(path) = &args.report {
        if let Err(e) = report.write_json(path) {
            error!("could not write run report: {}", e);
        }
    }
    result.map_err(LoaderError::run)
}
