//! `refresh` command: fill the distance cache for a batch.

use std::collections::BTreeSet;
use std::io::Write;

use homerank_core::{RefreshStats, Scorable, ScoreCacheStore, UserId};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::CliError;
use crate::batch::{Batch, Listings, load_batch};
use crate::config::RunArgs;
use crate::report::write_report;
use crate::services::{RoutingClientBuilder, Services};
use crate::sync::sync_batch;

/// JSON written by the `refresh` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RefreshReport {
    /// Pairs written to the cache.
    pub(crate) resolved: usize,
    /// Pairs among `resolved` answered by the routing service.
    pub(crate) routed: usize,
    /// Items or places skipped for lack of coordinates.
    pub(crate) skipped: usize,
}

impl From<RefreshStats> for RefreshReport {
    fn from(stats: RefreshStats) -> Self {
        Self {
            resolved: stats.resolved,
            routed: stats.routed,
            skipped: stats.skipped,
        }
    }
}

pub(crate) fn run_refresh_with(
    args: RunArgs,
    builder: &dyn RoutingClientBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let listings = load_batch(&config.input)?;
    let services = Services::open(&config, builder)?;
    let stats = match &listings {
        Listings::Apartments(batch) => refresh_batch(&services, batch, config.force)?,
        Listings::Homes(batch) => refresh_batch(&services, batch, config.force)?,
    };
    info!(
        "refreshed {} distance pairs ({} routed, {} skipped)",
        stats.resolved, stats.routed, stats.skipped
    );
    write_report(
        config.output.as_deref(),
        writer,
        &RefreshReport::from(stats),
    )
}

/// Apply listing and place edits, then re-resolve every pair when `force` is
/// set, otherwise only items with incomplete coverage. Owners whose
/// distances changed lose their cached scores.
fn refresh_batch<T>(
    services: &Services,
    batch: &Batch<T>,
    force: bool,
) -> Result<RefreshStats, CliError>
where
    T: Scorable + Serialize + DeserializeOwned,
{
    let mut stats = sync_batch(services, batch)?;
    let refreshed = if force {
        services
            .refresher
            .refresh_items(&batch.items, &batch.places)?
    } else {
        services
            .refresher
            .refresh_stale(&batch.items, &batch.places)?
    };
    stats += refreshed;
    if refreshed.resolved > 0 {
        let owners: BTreeSet<UserId> = batch.items.iter().map(T::owner).collect();
        for owner in owners {
            let removed = services.store.invalidate_user(owner)?;
            debug!("dropped {removed} cached scores for user {owner}");
        }
    }
    Ok(stats)
}
