//! Subscription tiers gating which factors and how many records a user may use.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Entitlement level of a signed-in user.
///
/// # Examples
/// ```
/// use homerank_core::Tier;
///
/// assert_eq!(Tier::Free.place_limit(), 1);
/// assert_eq!(Tier::Pro.listing_limit(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Tier {
    /// Restricted tier with a small fixed factor set.
    #[default]
    Free,
    /// Unrestricted tier with the full factor catalogue.
    Pro,
}

impl Tier {
    /// Maximum number of points of interest the user may keep.
    #[must_use]
    pub const fn place_limit(self) -> usize {
        match self {
            Self::Free => 1,
            Self::Pro => 5,
        }
    }

    /// Maximum number of listings per product the user may keep.
    #[must_use]
    pub const fn listing_limit(self) -> usize {
        match self {
            Self::Free => 2,
            Self::Pro => 20,
        }
    }

    /// Return the tier as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
