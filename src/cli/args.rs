//! CLI argument structures

use clap::Parser;
use std::path::PathBuf;

use crate::service::{CacheBehavior, RunLogLevel, StorageType};

/// Bundle a WDL workflow, register it with AWS HealthOmics, and start a run
#[derive(Parser, Debug)]
#[command(name = "wdl-omics-run")]
#[command(about = "wdl-omics-run - Run WDL workflows on AWS HealthOmics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: $WDL_OMICS_CONFIG or the per-user config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// AWS region (default: from the AWS environment or profile)
    #[arg(long)]
    pub region: Option<String>,

    /// Extra directory to search for imported WDL files
    #[arg(short = 'p', long = "path", value_name = "DIR")]
    pub path: Vec<PathBuf>,

    /// Register the workflow and print its id without starting a run
    #[arg(short, long)]
    pub build: bool,

    /// IAM role the service assumes for the run
    #[arg(long = "role-arn", visible_alias = "role", value_name = "ARN")]
    pub role_arn: Option<String>,

    /// S3 location for run outputs
    #[arg(long, value_name = "S3_URI")]
    pub output_uri: Option<String>,

    /// Run cache to use, by name
    #[arg(long, value_name = "NAME", conflicts_with = "cache_id")]
    pub cache: Option<String>,

    /// Run cache to use, by id
    #[arg(long, value_name = "ID")]
    pub cache_id: Option<String>,

    /// When the run cache stores task results
    #[arg(long, value_enum)]
    pub cache_behavior: Option<CacheBehavior>,

    /// Run storage type
    #[arg(long, value_enum)]
    pub storage_type: Option<StorageType>,

    /// Static run storage capacity in GiB
    #[arg(long, value_name = "GIB")]
    pub storage_capacity: Option<i32>,

    /// Run name
    #[arg(long)]
    pub name: Option<String>,

    /// Run priority
    #[arg(long)]
    pub priority: Option<i32>,

    /// Run group to start the run in
    #[arg(long, value_name = "ID")]
    pub run_group_id: Option<String>,

    /// Run log level
    #[arg(long, value_enum)]
    pub log_level: Option<RunLogLevel>,

    /// JSON inputs: a file, `-` for stdin, or a literal JSON object
    #[arg(short, long, value_name = "INPUT")]
    pub input: Option<String>,

    /// Set a String or Array input to empty
    #[arg(long, value_name = "KEY")]
    pub empty: Vec<String>,

    /// Set an optional input to null
    #[arg(long, value_name = "KEY")]
    pub none: Vec<String>,

    /// Main WDL file (local path or http(s) URL)
    #[arg(value_name = "MAIN_WDL")]
    pub wdl: String,

    /// Workflow inputs as key=value, or `?` to list them
    #[arg(value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "wdl-omics-run",
            "-vv",
            "--role",
            "arn:aws:iam::1:role/r",
            "--output-uri",
            "s3://b/out/",
            "--cache-behavior",
            "on-failure",
            "--cache-id",
            "99",
            "-p",
            "lib",
            "main.wdl",
            "docker=ubuntu",
            "threads=2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.role_arn.as_deref(), Some("arn:aws:iam::1:role/r"));
        assert_eq!(cli.cache_behavior, Some(CacheBehavior::OnFailure));
        assert_eq!(cli.path, vec![PathBuf::from("lib")]);
        assert_eq!(cli.wdl, "main.wdl");
        assert_eq!(cli.inputs, vec!["docker=ubuntu", "threads=2"]);
    }

    #[test]
    fn test_cache_flags_conflict() {
        assert!(Cli::try_parse_from([
            "wdl-omics-run",
            "--cache",
            "shared",
            "--cache-id",
            "1",
            "main.wdl"
        ])
        .is_err());
    }
}
