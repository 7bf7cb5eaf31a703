//! Strongly typed identifiers for users, listings, and points of interest.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw numeric identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Owner of listings, places, preferences, and cached scores.
    UserId
);
identifier!(
    /// A listing being ranked (an apartment or a home).
    ItemId
);
identifier!(
    /// A user-defined point of interest.
    PlaceId
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn identifiers_display_their_raw_value() {
        assert_eq!(ItemId(42).to_string(), "42");
        assert_eq!(UserId::from(7).get(), 7);
    }

    #[rstest]
    fn identifiers_order_numerically() {
        let mut ids = vec![PlaceId(3), PlaceId(1), PlaceId(2)];
        ids.sort_unstable();
        assert_eq!(ids, vec![PlaceId(1), PlaceId(2), PlaceId(3)]);
    }
}
