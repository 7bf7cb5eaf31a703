//! Persisted per-user composite scores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{ItemId, StoreError, UserId};

/// A stored score for one `(item, user)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCacheEntry {
    /// Scored listing.
    pub item: ItemId,
    /// Viewer the score was computed for.
    pub user: UserId,
    /// Composite score in `[0.0, 10.0]` with one decimal.
    pub score: f64,
    /// When the score was computed.
    pub computed_at: DateTime<Utc>,
}

/// Storage for [`ScoreCacheEntry`] values.
///
/// Scores are never patched in place. A recompute replaces the rows for a
/// user and item set wholesale, and any change to the user's inputs drops
/// all of the user's rows.
pub trait ScoreCacheStore: Send + Sync {
    /// Cached scores for `user` restricted to `items`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be read.
    fn cached_scores(
        &self,
        user: UserId,
        items: &[ItemId],
    ) -> Result<BTreeMap<ItemId, f64>, StoreError>;

    /// Delete the rows for `(user, items)` and insert `entries` atomically.
    ///
    /// # Errors
    /// Returns [`StoreError::Integrity`] when `entries` repeats an item, and
    /// [`StoreError::Backend`] when the write fails. On error the previous
    /// rows are left in place.
    fn replace_scores(
        &self,
        user: UserId,
        items: &[ItemId],
        entries: &[ScoreCacheEntry],
    ) -> Result<(), StoreError>;

    /// Delete every row for `user`, returning how many were removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be written.
    fn invalidate_user(&self, user: UserId) -> Result<usize, StoreError>;
}
