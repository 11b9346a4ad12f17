//! Resolving command-line settings and running the bundle/register/run flow

use std::future::Future;
use std::path::PathBuf;

use serde_json::json;
use tracing::{debug, info};

use super::args::Cli;
use crate::bundle::{BundleBuilder, SourceLocation, SourceReader};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::inputs::{describe_inputs, load_input_document, InputValidator, RawInputs};
use crate::registry::Registrar;
use crate::run::{self, CacheSelection, RunOptions};
use crate::service::{RunCacheDirectory, RunReceipt, RunSubmitter, WorkflowRegistry};

/// Fully resolved settings for one invocation: CLI flags over environment
/// over configuration file.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub wdl: String,
    pub region: Option<String>,
    pub search_paths: Vec<PathBuf>,
    pub build_only: bool,
    pub list_inputs: bool,
    pub inputs: RawInputs,
    pub run: RunOptions,
}

impl Invocation {
    pub fn from_cli(cli: Cli, config: Config) -> Result<Self> {
        let list_inputs = cli.inputs.len() == 1 && cli.inputs[0] == "?";

        if cli.build {
            let mut conflicting = Vec::new();
            if cli.output_uri.is_some() {
                conflicting.push("--output-uri");
            }
            if cli.input.is_some() {
                conflicting.push("--input");
            }
            if !cli.empty.is_empty() {
                conflicting.push("--empty");
            }
            if !cli.none.is_empty() {
                conflicting.push("--none");
            }
            if !cli.inputs.is_empty() && !list_inputs {
                conflicting.push("KEY=VALUE");
            }
            if !conflicting.is_empty() {
                return Err(Error::Usage(format!(
                    "--build cannot be combined with {}",
                    conflicting.join(", ")
                )));
            }
        }

        let inputs = if list_inputs || cli.build {
            RawInputs::default()
        } else {
            RawInputs {
                assignments: RawInputs::parse_assignments(&cli.inputs)?,
                document: cli.input.as_deref().map(load_input_document).transpose()?,
                empty: cli.empty,
                none: cli.none,
            }
        };

        let cache = match (cli.cache, cli.cache_id, config.cache_id) {
            (Some(name), _, _) => CacheSelection::Name(name),
            (None, Some(id), _) | (None, None, Some(id)) => CacheSelection::Id(id),
            (None, None, None) => CacheSelection::Disabled,
        };

        let run = RunOptions {
            role_arn: cli.role_arn.or(config.role_arn),
            output_uri: cli.output_uri.or(config.output_uri),
            name: cli.name,
            priority: cli.priority,
            run_group_id: cli.run_group_id,
            storage_type: cli.storage_type.or(config.storage_type),
            storage_capacity: cli.storage_capacity,
            cache,
            cache_behavior: cli.cache_behavior,
            log_level: cli.log_level.or(config.log_level).unwrap_or_default(),
        };

        let mut search_paths = cli.path;
        search_paths.extend(config.import_paths);

        Ok(Self {
            wdl: cli.wdl,
            region: cli.region.or(config.region),
            search_paths,
            build_only: cli.build,
            list_inputs,
            inputs,
            run,
        })
    }
}

/// What an invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Declared inputs listing for `?`.
    Inputs(String),
    /// Workflow registered or reused in build-only mode.
    Built { workflow_id: String },
    Started(RunReceipt),
}

impl Outcome {
    /// Text for standard output.
    pub fn render(&self) -> Result<String> {
        match self {
            Outcome::Inputs(text) => Ok(text.trim_end().to_string()),
            Outcome::Built { workflow_id } => {
                Ok(serde_json::to_string_pretty(&json!({ "workflowId": workflow_id }))?)
            }
            Outcome::Started(receipt) => Ok(serde_json::to_string_pretty(receipt)?),
        }
    }
}

/// Bundle, validate, register and run. `connect` is called only once all
/// local checks have passed, so nothing reaches the service on bad input.
pub async fn execute_command<S, F, Fut>(
    invocation: &Invocation,
    reader: &dyn SourceReader,
    connect: F,
) -> Result<Outcome>
where
    S: WorkflowRegistry + RunSubmitter + RunCacheDirectory,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let main = SourceLocation::parse(&invocation.wdl)?;
    let loaded = BundleBuilder::new(reader)
        .search_paths(invocation.search_paths.clone())
        .build(&main)
        .await?;
    let executable = loaded.executable()?;
    info!(
        "Bundle for {} has fingerprint {}",
        executable.name,
        loaded.bundle.fingerprint()
    );

    if invocation.list_inputs {
        return Ok(Outcome::Inputs(describe_inputs(executable)));
    }

    let parameters = if invocation.build_only {
        None
    } else {
        invocation.run.validate()?;
        let validator = InputValidator::new(executable, &loaded.structs);
        Some(validator.validate(&invocation.inputs)?)
    };

    let service = connect().await?;

    let cache = match parameters {
        Some(_) => invocation.run.resolve_cache(&service).await?,
        None => None,
    };

    let workflow_id = Registrar::new(&service).resolve(&loaded).await?;

    let Some(parameters) = parameters else {
        return Ok(Outcome::Built { workflow_id });
    };

    let request = invocation.run.request(&workflow_id, parameters, cache)?;
    debug!("Run request id {}", request.request_id);
    let receipt = run::submit(&service, &request).await?;
    Ok(Outcome::Started(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["wdl-omics-run"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            role_arn: Some("config-role".into()),
            output_uri: Some("s3://config/out/".into()),
            region: Some("eu-west-1".into()),
            cache_id: Some("111".into()),
            import_paths: vec![PathBuf::from("/opt/wdl")],
            ..Default::default()
        };
        let invocation = Invocation::from_cli(
            cli(&["--role-arn", "cli-role", "-p", "lib", "main.wdl", "a=1"]),
            config,
        )
        .unwrap();

        assert_eq!(invocation.run.role_arn.as_deref(), Some("cli-role"));
        assert_eq!(invocation.run.output_uri.as_deref(), Some("s3://config/out/"));
        assert_eq!(invocation.region.as_deref(), Some("eu-west-1"));
        assert_eq!(invocation.run.cache, CacheSelection::Id("111".into()));
        assert_eq!(
            invocation.search_paths,
            vec![PathBuf::from("lib"), PathBuf::from("/opt/wdl")]
        );
        assert_eq!(
            invocation.inputs.assignments,
            vec![("a".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_cache_name_wins_over_configured_id() {
        let config = Config {
            cache_id: Some("111".into()),
            ..Default::default()
        };
        let invocation =
            Invocation::from_cli(cli(&["--cache", "shared", "main.wdl"]), config).unwrap();
        assert_eq!(invocation.run.cache, CacheSelection::Name("shared".into()));
    }

    #[test]
    fn test_build_rejects_run_arguments() {
        let err = Invocation::from_cli(
            cli(&["-b", "--output-uri", "s3://b/", "main.wdl", "a=1"]),
            Config::default(),
        )
        .unwrap_err();
        match err {
            Error::Usage(msg) => {
                assert!(msg.contains("--output-uri"));
                assert!(msg.contains("KEY=VALUE"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let configured = Config {
            output_uri: Some("s3://config/out/".into()),
            ..Default::default()
        };
        assert!(Invocation::from_cli(cli(&["-b", "main.wdl"]), configured).is_ok());
    }

    #[test]
    fn test_build_accepts_role_arn() {
        let invocation = Invocation::from_cli(
            cli(&["--role-arn", "arn:aws:iam::1:role/r", "--build", "main.wdl"]),
            Config::default(),
        )
        .unwrap();
        assert!(invocation.build_only);
        assert_eq!(invocation.run.role_arn.as_deref(), Some("arn:aws:iam::1:role/r"));
    }

    #[test]
    fn test_question_mark_lists_inputs() {
        let invocation = Invocation::from_cli(cli(&["main.wdl", "?"]), Config::default()).unwrap();
        assert!(invocation.list_inputs);
        assert!(invocation.inputs.is_empty());
    }

    #[test]
    fn test_render_build_outcome() {
        let text = Outcome::Built {
            workflow_id: "1234567".into(),
        }
        .render()
        .unwrap();
        assert_eq!(text, "{\n  \"workflowId\": \"1234567\"\n}");
    }
}
