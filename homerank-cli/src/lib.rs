//! Command-line interface for ranking listings and warming the distance
//! cache.
#![forbid(unsafe_code)]

mod batch;
mod config;
mod error;
mod refresh;
mod report;
mod score;
mod services;
mod sync;

use std::io::Write;

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};

pub use error::CliError;

use crate::config::RunArgs;
use crate::refresh::run_refresh_with;
use crate::score::run_score_with;
use crate::services::{DefaultRoutingClientBuilder, RoutingClientBuilder};

const ARG_INPUT: &str = "input";
const ARG_DATABASE: &str = "database";
const ARG_OUTPUT: &str = "output";
const ARG_ROUTING_API_KEY: &str = "routing-api-key";
const ARG_ROUTING_BASE_URL: &str = "routing-base-url";
const ARG_ROUTING_TIMEOUT_SECS: &str = "routing-timeout-secs";
const ARG_ROUTING_CONCURRENCY: &str = "routing-concurrency";
const ENV_INPUT: &str = "HOMERANK_INPUT";

/// Log level used when neither `RUST_LOG` nor `--log-level` is set.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Run the homerank CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help and version output are not failures.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    let _logger = init_logging(cli.log_level.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &DefaultRoutingClientBuilder, &mut stdout)
}

fn run_command(
    command: Command,
    builder: &dyn RoutingClientBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Score(args) => run_score_with(args, builder, writer),
        Command::Refresh(args) => run_refresh_with(args, builder, writer),
    }
}

/// Start logging to standard error. `RUST_LOG` wins over `level`.
fn init_logging(level: Option<&str>) -> Result<LoggerHandle, CliError> {
    let handle = Logger::try_with_env_or_str(level.unwrap_or(DEFAULT_LOG_LEVEL))?
        .log_to_stderr()
        .start()?;
    Ok(handle)
}

#[derive(Debug, Parser)]
#[command(
    name = "homerank",
    about = "Rank rental and purchase listings by weighted preferences",
    version
)]
struct Cli {
    /// Log filter such as `info` or `homerank_core=debug`.
    #[arg(long, global = true, value_name = "spec")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a batch of listings for its viewer, reusing cached scores.
    Score(RunArgs),
    /// Resolve missing listing-to-place distances into the cache.
    Refresh(RunArgs),
}

#[cfg(test)]
mod tests;
