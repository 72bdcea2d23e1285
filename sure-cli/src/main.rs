use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sure_api::SureClient;
use sure_core::{CliError, ErrorCode};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod output;
mod propose_cmd;
mod state;

use output::OutputFormat;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("SURE_BUILD_SHA"),
    ", built ",
    env!("SURE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sure", version = VERSION, about = "Agent-friendly CLI for the Sure personal-finance API")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format (table falls back to json when a result has no table view)
    #[arg(long, value_enum, global = true, env = "SURE_FORMAT", default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Override the configured API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose automations (rules)
    Propose {
        #[command(subcommand)]
        command: ProposeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProposeCommand {
    /// Propose categorization rules based on transaction patterns
    Rules {
        /// Lookback months (values <= 0 use the default of 3)
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        months: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => output::fail(&e),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("sure={level},sure_api={level},sure_core={level}"))
    });

    // stdout carries the envelope; logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Propose { command } => match command {
            ProposeCommand::Rules { months } => {
                let client = connect(cli.api_url.as_deref())?;
                let env = propose_cmd::run(&client, months).await?;
                output::print(cli.format, &env)
                    .map_err(|e| CliError::wrap(ErrorCode::Unknown, "Could not write output", e))?;
            }
        },
    }

    Ok(())
}

fn connect(api_url: Option<&str>) -> Result<SureClient, CliError> {
    let cfg = config::load_config()
        .map_err(|e| CliError::wrap(ErrorCode::ConfigInvalid, format!("{e:#}"), e))?
        .apply_env(|k| std::env::var(k).ok())
        .with_api_url(api_url);

    SureClient::new(&cfg.client_config()?)
}
