use clap::Parser;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use wdl_omics_run::bundle::DefaultSourceReader;
use wdl_omics_run::cli::{execute_command, get_log_level, Cli, Invocation};
use wdl_omics_run::config::Config;
use wdl_omics_run::service::OmicsBackend;
use wdl_omics_run::Result;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(get_log_level(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("wdl-omics-run started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli).await {
        debug!("Fatal error: {:?}", e);
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let invocation = Invocation::from_cli(cli, config)?;
    let reader = DefaultSourceReader::new();
    let region = invocation.region.clone();

    let outcome = execute_command(&invocation, &reader, || async move {
        OmicsBackend::new(region.as_deref()).await
    })
    .await?;

    println!("{}", outcome.render()?);
    Ok(())
}
