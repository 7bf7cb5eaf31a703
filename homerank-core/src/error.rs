//! Errors shared by the persistence traits.

use thiserror::Error;

/// Boxed error raised by a storage backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`DistanceCacheStore`](crate::DistanceCacheStore),
/// [`ScoreCacheStore`](crate::ScoreCacheStore) and
/// [`PreferenceStore`](crate::PreferenceStore) implementations.
///
/// Only persistence failures propagate out of the engine; routing failures
/// and missing data degrade inside it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed while performing `operation`.
    #[error("storage backend failed to {operation}")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: BackendError,
    },
    /// A write would have produced two rows for one key.
    ///
    /// The replace and upsert protocols rule this out, so seeing it means a
    /// caller or backend is broken. It is never retried or ignored.
    #[error("integrity violation while trying to {operation}: {detail}")]
    Integrity {
        /// Description of the failed operation.
        operation: &'static str,
        /// Human-readable description of the conflicting key.
        detail: String,
    },
}

impl StoreError {
    /// Wrap a backend error with the operation that raised it.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<BackendError>,
    {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    /// Whether the error reports a uniqueness violation.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}
