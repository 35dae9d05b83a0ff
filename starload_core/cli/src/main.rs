mod commands;

use crate::commands::{
    handle_check, handle_compile, handle_create_tables, handle_run, CheckArgs, CompileArgs,
    RunArgs,
};
use clap::{Parser, Subcommand};
use common::error::LoaderError;
use logging::init_logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "starload", about = "Load event logs into a star schema warehouse")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "directory holding warehouse-project.yml",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Drop and recreate every table
    CreateTables,
    /// Print the rendered SQL statements
    Compile(CompileArgs),
    /// Load staging tables, then build the star schema
    Run(RunArgs),
    /// Run data quality checks against the loaded tables
    Check(CheckArgs),
}

fn run_cmd(func: Result<(), LoaderError>) {
    if let Err(e) = func {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    init_logger();
    let cli = Cli::parse();

    match &cli.command {
        Cmd::CreateTables => run_cmd(handle_create_tables(cli.config_path.clone())),
        Cmd::Compile(args) => run_cmd(handle_compile(args, cli.config_path.clone())),
        Cmd::Run(args) => run_cmd(handle_run(args, cli.config_path.clone())),
        Cmd::Check(args) => run_cmd(handle_check(args, cli.config_path.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{compile_catalog, PhaseArg};
    use test_utils::get_root_dir;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "starload",
            "run",
            "--create-tables",
            "--report",
            "out/run.json",
            "-c",
            "project",
        ])
        .unwrap();
        assert_eq!(cli.config_path, Some(PathBuf::from("project")));
        match cli.command {
            Cmd::Run(args) => {
                assert!(args.create_tables);
                assert_eq!(args.report, Some(PathBuf::from("out/run.json")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_compile_phase() {
        let cli = Cli::try_parse_from(["starload", "compile", "--phase", "transform"]).unwrap();
        match cli.command {
            Cmd::Compile(args) => assert_eq!(args.phase, Some(PhaseArg::Transform)),
            _ => panic!("expected compile"),
        }
        assert!(Cli::try_parse_from(["starload", "compile", "--phase", "vacuum"]).is_err());
    }

    #[test]
    fn compiles_example_project() {
        let sql = compile_catalog(Some(get_root_dir()), Some(PhaseArg::Load)).unwrap();
        assert!(sql.contains("COPY staging_events FROM 's3://udacity-dend/log_data'"));
        assert!(sql.contains("CREDENTIALS 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(!sql.contains("INSERT INTO"));

        let all = compile_catalog(Some(get_root_dir()), None).unwrap();
        assert!(all.starts_with("-- drop staging_events\nDROP TABLE IF EXISTS staging_events;"));
        assert!(all.contains("DISTSTYLE ALL;"));
    }

    #[test]
    fn defaults_to_current_directory() {
        let sql = test_utils::with_chdir(get_root_dir(), || {
            compile_catalog(None, Some(PhaseArg::Transform))
        })
        .unwrap()
        .unwrap();
        assert!(sql.contains("EXTRACT(WEEKDAY FROM ts)"));
        assert_eq!(sql.matches("INSERT INTO").count(), 5);
    }

    #[test]
    fn missing_project_is_an_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_catalog(Some(dir.path().to_path_buf()), None).unwrap_err();
        assert!(matches!(err, LoaderError::Init { .. }));
        assert!(err.to_string().contains("initialisation failed"));
    }

    #[test]
    fn refused_connection_is_reported_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("warehouse-project.yml"),
            "name: sparkify\n\
             version: \"1.0.0\"\n\
             dialect: postgres\n\
             connection_profile:\n  profile: local\n  path: connections.yml\n\
             sources:\n\
             \x20 log_data: s3://udacity-dend/log_data\n\
             \x20 log_jsonpath: s3://udacity-dend/log_json_path.json\n\
             \x20 song_data: s3://udacity-dend/song_data\n\
             \x20 iam_role: arn:aws:iam::123456789012:role/dwhRole\n\
             \x20 region: us-west-2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("connections.yml"),
            "local:\n  adapter: postgres\n  host: 127.0.0.1\n  user: postgres\n  \
             database: postgres\n  password: postgres\n  port: \"1\"\n",
        )
        .unwrap();
        let report_path = dir.path().join("run.json");

        let err = handle_run(
            &RunArgs {
                create_tables: false,
                report: Some(report_path.clone()),
            },
            Some(dir.path().to_path_buf()),
        )
        .unwrap_err();
        assert!(matches!(err, LoaderError::Run { .. }));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(value["state"], "FAILED");
        assert!(value["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(value["finished_at"].is_string());
        assert_eq!(value["statements"].as_array().map(Vec::len), Some(0));
    }
}
