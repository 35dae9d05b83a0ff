use super::load_project;
use catalog::Phase;
use clap::{Args, ValueEnum};
use common::error::LoaderError;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    Drop,
    Create,
    Load,
    Transform,
}

impl From<PhaseArg> for Phase {
    fn from(value: PhaseArg) -> Self {
        match value {
            PhaseArg::Drop => Phase::Drop,
            PhaseArg::Create => Phase::Create,
            PhaseArg::Load => Phase::Load,
            PhaseArg::Transform => Phase::Transform,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Only print the statements of this phase
    #[arg(long, value_enum)]
    pub phase: Option<PhaseArg>,
}

/// Render the catalog without connecting to the warehouse.
pub fn compile_catalog(
    config_path: Option<PathBuf>,
    phase: Option<PhaseArg>,
) -> Result<String, LoaderError> {
    let (_, catalog) = load_project(config_path)?;
    Ok(catalog.render(phase.map(Phase::from)))
}

pub fn handle_compile(args: &CompileArgs, config_path: Option<PathBuf>) -> Result<(), LoaderError> {
    let rendered = compile_catalog(config_path, args.phase)?;
    println!("{}", rendered);
    Ok(())
}
