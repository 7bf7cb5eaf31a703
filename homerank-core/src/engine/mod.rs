//! Multi-factor scoring of listings for a viewer.
//!
//! A run gathers the viewer's weights, reads the batch's distance summaries
//! in one call, scores every item with [`score_items`], and, for signed-in
//! viewers, replaces the viewer's cached scores for the batch.

mod compute;
mod report;

pub use compute::score_items;
pub use report::{Evaluation, FactorContribution};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::weights::active_weights;
use crate::{
    DerivationChoices, DistanceCacheStore, DistanceRefresher, Factor, ItemId, PointOfInterest,
    PreferenceSet, PreferenceStore, Scorable, ScoreCacheEntry, ScoreCacheStore, StoreError, Tier,
    UserId, UserLocks,
};

/// Who is looking at the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Visitor without an account. Uses the catalogue's anonymous weights and
    /// never touches the score cache.
    Anonymous,
    /// Signed-in user.
    Registered {
        /// The user.
        user: UserId,
        /// The user's subscription tier.
        tier: Tier,
    },
}

impl Viewer {
    /// Signed-in user id, if any.
    #[must_use]
    pub const fn user(self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Registered { user, .. } => Some(user),
        }
    }
}

/// Scores returned by [`ScoringEngine::get_or_calculate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreLookup {
    /// Every item had a cached score.
    Cached(BTreeMap<ItemId, f64>),
    /// The batch was scored afresh.
    Computed(Evaluation),
}

impl ScoreLookup {
    /// The scores, whichever way they were obtained.
    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<ItemId, f64> {
        match self {
            Self::Cached(scores) => scores,
            Self::Computed(evaluation) => &evaluation.scores,
        }
    }

    /// Whether the scores came from the cache.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

/// Orchestrates preference lookup, distance reads, scoring, and caching.
#[derive(Clone)]
pub struct ScoringEngine {
    preferences: Arc<dyn PreferenceStore>,
    distances: Arc<dyn DistanceCacheStore>,
    scores: Arc<dyn ScoreCacheStore>,
    locks: Arc<UserLocks>,
    refresher: Option<DistanceRefresher>,
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("refresher", &self.refresher)
            .finish_non_exhaustive()
    }
}

impl ScoringEngine {
    /// Create an engine over the given stores.
    #[must_use]
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        distances: Arc<dyn DistanceCacheStore>,
        scores: Arc<dyn ScoreCacheStore>,
    ) -> Self {
        Self {
            preferences,
            distances,
            scores,
            locks: Arc::new(UserLocks::new()),
            refresher: None,
        }
    }

    /// Share a lock table with other writers of the same stores.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<UserLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Fill missing distance pairs before each run.
    #[must_use]
    pub fn with_refresher(mut self, refresher: DistanceRefresher) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Active weights and derivation choices for `viewer`.
    ///
    /// Anonymous viewers get the catalogue's fixed weights without tier
    /// gating; signed-in viewers get their stored preferences filtered by
    /// their tier's allow-list.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the preference store fails.
    pub fn weights_for<T: Scorable>(
        &self,
        viewer: Viewer,
    ) -> Result<(BTreeMap<Factor, u8>, DerivationChoices), StoreError> {
        let catalogue = T::CATALOGUE;
        let (preferences, allowed) = match viewer {
            Viewer::Anonymous => (PreferenceSet::anonymous(catalogue), catalogue.pro),
            Viewer::Registered { user, tier } => (
                self.preferences.get_or_create_default(user, catalogue)?,
                catalogue.allowed(tier),
            ),
        };
        Ok((active_weights(&preferences, allowed), preferences.choices()))
    }

    /// Score `items` for `viewer` without touching the score cache.
    ///
    /// `places` are the viewer's points of interest; they label the distance
    /// view and drive the distance factor.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a store read fails or a distance refresh
    /// cannot be written.
    pub fn evaluate<T: Scorable>(
        &self,
        viewer: Viewer,
        items: &[T],
        places: &[PointOfInterest],
    ) -> Result<Evaluation, StoreError> {
        let (active, choices) = self.weights_for::<T>(viewer)?;
        if let Some(refresher) = &self.refresher {
            refresher.refresh_stale(items, places)?;
        }
        let ids: Vec<ItemId> = items.iter().map(T::id).collect();
        let distances = self.distances.batch_averages(&ids, places)?;
        debug!(
            "scoring {} {} with {} active factors",
            items.len(),
            T::CATALOGUE.product,
            active.len()
        );
        Ok(score_items(items, &active, choices, &distances))
    }

    /// Score `items` and replace the viewer's cached scores for them.
    ///
    /// Anonymous viewers are scored but never persisted.
    ///
    /// # Errors
    /// Returns [`StoreError`] when scoring or the replacement fails. An
    /// integrity violation is returned, not retried.
    pub fn calculate_and_cache<T: Scorable>(
        &self,
        viewer: Viewer,
        items: &[T],
        places: &[PointOfInterest],
    ) -> Result<Evaluation, StoreError> {
        let evaluation = self.evaluate(viewer, items, places)?;
        let Some(user) = viewer.user() else {
            return Ok(evaluation);
        };
        let computed_at = Utc::now();
        let entries: Vec<ScoreCacheEntry> = evaluation
            .scores
            .iter()
            .map(|(item, score)| ScoreCacheEntry {
                item: *item,
                user,
                score: *score,
                computed_at,
            })
            .collect();
        self.locks.with_lock(user, || {
            self.scores
                .replace_scores(user, &evaluation.items, &entries)
        })?;
        info!(
            "cached {} scores for user {user} across {} items",
            entries.len(),
            evaluation.items.len()
        );
        Ok(evaluation)
    }

    /// Return cached scores when every item has one, otherwise recompute the
    /// whole batch.
    ///
    /// `force` skips the cache read.
    ///
    /// # Errors
    /// See [`Self::calculate_and_cache`].
    pub fn get_or_calculate<T: Scorable>(
        &self,
        viewer: Viewer,
        items: &[T],
        places: &[PointOfInterest],
        force: bool,
    ) -> Result<ScoreLookup, StoreError> {
        if let (Some(user), false) = (viewer.user(), force) {
            let ids: Vec<ItemId> = items.iter().map(T::id).collect();
            let cached = self.scores.cached_scores(user, &ids)?;
            if !ids.is_empty() && ids.iter().all(|id| cached.contains_key(id)) {
                debug!("serving {} cached scores for user {user}", cached.len());
                return Ok(ScoreLookup::Cached(cached));
            }
        }
        self.calculate_and_cache(viewer, items, places)
            .map(ScoreLookup::Computed)
    }

    /// Drop every cached score for the user and rescore `items`.
    ///
    /// # Errors
    /// See [`Self::calculate_and_cache`].
    pub fn recalculate_user_scores<T: Scorable>(
        &self,
        user: UserId,
        tier: Tier,
        items: &[T],
        places: &[PointOfInterest],
    ) -> Result<Evaluation, StoreError> {
        let removed = self
            .locks
            .with_lock(user, || self.scores.invalidate_user(user))?;
        debug!("dropped {removed} cached scores for user {user} before rescoring");
        self.calculate_and_cache(Viewer::Registered { user, tier }, items, places)
    }
}
