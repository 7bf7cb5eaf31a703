//! Engine wiring over the SQLite store and the routing client.

use std::sync::Arc;

use homerank_core::{
    ChangeHooks, DistanceRefresher, GeoDistanceResolver, PreferenceSet, PreferenceStore,
    RoutingClient, Scorable, ScoringEngine, UserId, UserLocks,
};
use homerank_routing::{DistanceMatrixClient, DistanceMatrixConfig};
use homerank_store::SqliteStore;
use log::info;

use crate::CliError;
use crate::config::{RoutingOptions, RunConfig};

/// Builds the routing client for one invocation.
pub(crate) trait RoutingClientBuilder {
    fn build(&self, options: &RoutingOptions) -> Result<Arc<dyn RoutingClient>, CliError>;
}

/// Builds a [`DistanceMatrixClient`] from the configured options.
pub(crate) struct DefaultRoutingClientBuilder;

impl RoutingClientBuilder for DefaultRoutingClientBuilder {
    fn build(&self, options: &RoutingOptions) -> Result<Arc<dyn RoutingClient>, CliError> {
        if !options.is_configured() {
            info!("no routing API key configured; distances use great-circle miles");
        }
        let config = DistanceMatrixConfig::new(options.api_key.clone())
            .with_base_url(options.base_url.clone())
            .with_timeout(options.timeout)
            .with_max_concurrency(options.max_concurrency);
        let client = DistanceMatrixClient::with_config(config).map_err(|source| {
            CliError::BuildRoutingClient {
                base_url: options.base_url.clone(),
                source,
            }
        })?;
        Ok(Arc::new(client))
    }
}

/// Everything a command needs, sharing one store and one lock table.
pub(crate) struct Services {
    pub(crate) store: Arc<SqliteStore>,
    pub(crate) engine: ScoringEngine,
    pub(crate) refresher: DistanceRefresher,
    pub(crate) hooks: ChangeHooks,
}

impl Services {
    pub(crate) fn open(
        config: &RunConfig,
        builder: &dyn RoutingClientBuilder,
    ) -> Result<Self, CliError> {
        let store =
            Arc::new(
                SqliteStore::open(&config.database).map_err(|source| CliError::OpenStore {
                    path: config.database.clone(),
                    source,
                })?,
            );
        let client = builder.build(&config.routing)?;
        let locks = Arc::new(UserLocks::new());
        let refresher = DistanceRefresher::new(
            store.clone(),
            GeoDistanceResolver::new(client),
            locks.clone(),
        );
        let engine = ScoringEngine::new(store.clone(), store.clone(), store.clone())
            .with_locks(locks.clone())
            .with_refresher(refresher.clone());
        let hooks = ChangeHooks::new(store.clone(), store.clone(), refresher.clone(), locks);
        Ok(Self {
            store,
            engine,
            refresher,
            hooks,
        })
    }

    /// Store `preferences` for `user` when they differ from the stored set,
    /// dropping the user's cached scores.
    pub(crate) fn apply_preferences<T: Scorable>(
        &self,
        user: UserId,
        preferences: &PreferenceSet,
    ) -> Result<bool, CliError> {
        let stored = self.store.get_or_create_default(user, T::CATALOGUE)?;
        if stored == *preferences {
            return Ok(false);
        }
        self.store.save(user, T::CATALOGUE, preferences)?;
        self.hooks.preferences_saved(user)?;
        info!(
            "saved new {} preferences for user {user}",
            T::CATALOGUE.product
        );
        Ok(true)
    }
}
