//! `score` command: rank a batch for its viewer.

use std::collections::BTreeMap;
use std::io::Write;

use homerank_core::{
    DistanceSummary, Evaluation, FactorContribution, ItemId, Scorable, ScoreLookup,
};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::CliError;
use crate::batch::{Batch, Listings, load_batch};
use crate::config::RunArgs;
use crate::report::write_report;
use crate::services::{RoutingClientBuilder, Services};
use crate::sync::sync_batch;

/// JSON written by the `score` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScoreReport {
    /// Whether every score came from the cache.
    pub(crate) cached: bool,
    /// Item ids, best first; unscored items last.
    pub(crate) ranked: Vec<ItemId>,
    pub(crate) scores: BTreeMap<ItemId, f64>,
    /// Empty when served from the cache.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) breakdowns: BTreeMap<ItemId, Vec<FactorContribution>>,
    /// Empty when served from the cache.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) distances: BTreeMap<ItemId, DistanceSummary>,
}

impl ScoreReport {
    pub(crate) fn from_lookup(items: Vec<ItemId>, lookup: ScoreLookup) -> Self {
        match lookup {
            ScoreLookup::Cached(scores) => {
                let ranking = Evaluation {
                    items,
                    scores,
                    ..Evaluation::default()
                };
                Self {
                    cached: true,
                    ranked: ranking.ranked(),
                    scores: ranking.scores,
                    breakdowns: BTreeMap::new(),
                    distances: BTreeMap::new(),
                }
            }
            ScoreLookup::Computed(evaluation) => Self {
                cached: false,
                ranked: evaluation.ranked(),
                scores: evaluation.scores,
                breakdowns: evaluation.breakdowns,
                distances: evaluation.distances,
            },
        }
    }
}

pub(crate) fn run_score_with(
    args: RunArgs,
    builder: &dyn RoutingClientBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let listings = load_batch(&config.input)?;
    let services = Services::open(&config, builder)?;
    let report = match &listings {
        Listings::Apartments(batch) => score_batch(&services, batch, config.force)?,
        Listings::Homes(batch) => score_batch(&services, batch, config.force)?,
    };
    info!(
        "scored {} of {} {:?} ({})",
        report.scores.len(),
        report.ranked.len(),
        listings.kind(),
        if report.cached { "cached" } else { "computed" }
    );
    write_report(config.output.as_deref(), writer, &report)
}

/// Store new preferences and apply listing or place edits, then rank.
fn score_batch<T>(
    services: &Services,
    batch: &Batch<T>,
    force: bool,
) -> Result<ScoreReport, CliError>
where
    T: Scorable + Serialize + DeserializeOwned,
{
    if let (Some(user), Some(preferences)) = (batch.viewer.user(), &batch.preferences) {
        services.apply_preferences::<T>(user, preferences)?;
    }
    sync_batch(services, batch)?;
    let lookup =
        services
            .engine
            .get_or_calculate(batch.viewer, &batch.items, &batch.places, force)?;
    let items = batch.items.iter().map(T::id).collect();
    Ok(ScoreReport::from_lookup(items, lookup))
}
