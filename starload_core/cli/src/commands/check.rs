use super::{load_project, runtime};
use clap::Args;
use common::error::LoaderError;
use executor::{connect, QualityChecker};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Treat duplicated dim_users keys as a failure
    #[arg(long)]
    pub strict: bool,
}

pub fn handle_check(args: &CheckArgs, config_path: Option<PathBuf>) -> Result<(), LoaderError> {
    let (cfg, _) = load_project(config_path)?;
    let report = runtime()?
        .block_on(async {
            let adapter = connect(&cfg).await?;
            QualityChecker::run(&*adapter).await
        })
        .map_err(LoaderError::run)?;

    let problems = report.problems(args.strict);
    for problem in &problems {
        warn!("{}", problem);
    }
    if !problems.is_empty() {
        return Err(LoaderError::check(format!(
            "{} data quality problems found",
            problems.len()
        )));
    }
    info!("all data quality checks passed");
    Ok(())
}
