//! Layered options shared by the `score` and `refresh` commands.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use homerank_routing::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_INPUT, ARG_OUTPUT, ARG_ROUTING_API_KEY, ARG_ROUTING_BASE_URL,
    ARG_ROUTING_CONCURRENCY, ARG_ROUTING_TIMEOUT_SECS, CliError, ENV_INPUT,
};

/// Database file used when `--database` is not given.
pub(crate) const DEFAULT_DATABASE: &str = "homerank.db";

/// CLI arguments for the `score` and `refresh` subcommands.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read a JSON batch holding one viewer's listings and places. \
                 Options can come from CLI flags, configuration files, or \
                 HOMERANK_* environment variables. Routing is only attempted \
                 when an API key is configured; otherwise distances fall back \
                 to great-circle miles."
)]
#[ortho_config(prefix = "HOMERANK")]
pub(crate) struct RunArgs {
    /// Path to the JSON input batch.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// SQLite database holding cached distances, scores and preferences.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// API key for the routing service.
    #[arg(long = ARG_ROUTING_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) routing_api_key: Option<String>,
    /// Endpoint of the routing service.
    #[arg(long = ARG_ROUTING_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) routing_base_url: Option<String>,
    /// Per-request routing timeout in seconds.
    #[arg(long = ARG_ROUTING_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) routing_timeout_secs: Option<u64>,
    /// Maximum routing requests in flight.
    #[arg(long = ARG_ROUTING_CONCURRENCY, value_name = "n")]
    #[serde(default)]
    pub(crate) routing_concurrency: Option<usize>,
    /// Ignore cached results: rescore every item, or re-resolve every
    /// distance pair.
    #[arg(long)]
    #[serde(default)]
    pub(crate) force: bool,
    /// Write the JSON report here instead of standard output.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl RunArgs {
    pub(crate) fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RunConfig::try_from(merged)
    }
}

/// Routing client settings after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoutingOptions {
    /// Empty when routing is not configured.
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) max_concurrency: usize,
}

impl RoutingOptions {
    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Resolved command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
    pub(crate) routing: RoutingOptions,
    pub(crate) force: bool,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TryFrom<RunArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: RunArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let timeout_secs = args.routing_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_ROUTING_TIMEOUT_SECS,
                reason: "timeout must be at least one second",
            });
        }
        let max_concurrency = args.routing_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_ROUTING_CONCURRENCY,
                reason: "at least one request must be allowed in flight",
            });
        }
        Ok(Self {
            input,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            routing: RoutingOptions {
                api_key: args.routing_api_key.unwrap_or_default(),
                base_url: args
                    .routing_base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
                timeout: Duration::from_secs(timeout_secs),
                max_concurrency,
            },
            force: args.force,
            output: args.output,
        })
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RunConfig, CliError> {
    let merged = RunArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RunConfig::try_from(merged)
}
