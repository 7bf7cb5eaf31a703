//! Scorable factors and the per-product factor catalogues.
//!
//! A [`Factor`] names one attribute that can contribute to a composite score.
//! Each listing kind publishes a static [`Catalogue`] describing which factors
//! each [`Tier`] may use, the labels shown in score breakdowns, and the weights
//! applied to anonymous visitors.
//!
//! # Examples
//! ```
//! use homerank_core::{Factor, Tier, catalogue::APARTMENTS};
//!
//! assert_eq!(Factor::Price.as_str(), "price");
//! assert_eq!(APARTMENTS.allowed(Tier::Free), &[Factor::Price, Factor::Distance]);
//! assert_eq!(APARTMENTS.label(Factor::Price), "Rent");
//! ```

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Tier;

/// A single scorable attribute.
///
/// The declaration order doubles as the tie-break order when two factors
/// carry the same weight in a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Factor {
    /// Headline price: monthly rent or purchase price.
    Price,
    /// Monthly rent after concessions are spread across the lease.
    NetEffectiveRent,
    /// Net effective rent plus parking and utilities.
    TotalCost,
    /// Interior floor area in square feet.
    #[cfg_attr(feature = "serde", serde(rename = "sqft"))]
    SquareFootage,
    /// Average distance to the owner's points of interest.
    Distance,
    /// Bedroom count (half rooms allowed).
    Bedrooms,
    /// Bathroom count (half rooms allowed).
    Bathrooms,
    /// Total concession value over the lease.
    Discount,
    /// Monthly parking cost.
    Parking,
    /// Monthly utilities cost.
    Utilities,
    /// View quality rating from one to five.
    View,
    /// Whether the unit has a balcony.
    Balcony,
    /// Monthly homeowners association fees.
    HoaFees,
    /// Annual property taxes.
    PropertyTaxes,
    /// Lot size in square feet.
    LotSize,
    /// Construction year.
    YearBuilt,
}

impl Factor {
    /// Every factor in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Price,
        Self::NetEffectiveRent,
        Self::TotalCost,
        Self::SquareFootage,
        Self::Distance,
        Self::Bedrooms,
        Self::Bathrooms,
        Self::Discount,
        Self::Parking,
        Self::Utilities,
        Self::View,
        Self::Balcony,
        Self::HoaFees,
        Self::PropertyTaxes,
        Self::LotSize,
        Self::YearBuilt,
    ];

    /// Return the stable key used in preferences and persisted payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::NetEffectiveRent => "net_effective_rent",
            Self::TotalCost => "total_cost",
            Self::SquareFootage => "sqft",
            Self::Distance => "distance",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::Discount => "discount",
            Self::Parking => "parking",
            Self::Utilities => "utilities",
            Self::View => "view",
            Self::Balcony => "balcony",
            Self::HoaFees => "hoa_fees",
            Self::PropertyTaxes => "property_taxes",
            Self::LotSize => "lot_size",
            Self::YearBuilt => "year_built",
        }
    }

    /// Whether lower raw values score higher for this factor.
    #[must_use]
    pub const fn inverted(self) -> bool {
        matches!(
            self,
            Self::Price
                | Self::NetEffectiveRent
                | Self::TotalCost
                | Self::Distance
                | Self::Parking
                | Self::Utilities
                | Self::HoaFees
                | Self::PropertyTaxes
        )
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown factor key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown factor '{key}'")]
pub struct ParseFactorError {
    /// The rejected key.
    pub key: String,
}

impl std::str::FromStr for Factor {
    type Err = ParseFactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|factor| factor.as_str() == normalised)
            .ok_or_else(|| ParseFactorError { key: s.to_owned() })
    }
}

/// Static description of the factors a listing kind supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalogue {
    /// Product slug used to partition preferences.
    pub product: &'static str,
    /// Factors available on the free tier.
    pub free: &'static [Factor],
    /// Factors available on the pro tier, in display order.
    pub pro: &'static [Factor],
    /// Breakdown labels per factor.
    pub labels: &'static [(Factor, &'static str)],
    /// Weights applied when the viewer is not signed in.
    pub anonymous_weights: &'static [(Factor, u8)],
}

impl Catalogue {
    /// Return the allow-list for `tier`.
    #[must_use]
    pub const fn allowed(&self, tier: Tier) -> &'static [Factor] {
        match tier {
            Tier::Free => self.free,
            Tier::Pro => self.pro,
        }
    }

    /// Return the display label for `factor`, falling back to its key.
    #[must_use]
    pub fn label(&self, factor: Factor) -> &'static str {
        self.labels
            .iter()
            .find(|(candidate, _)| *candidate == factor)
            .map_or_else(|| factor.as_str(), |(_, label)| *label)
    }

    /// Whether any tier of this catalogue can score `factor`.
    #[must_use]
    pub fn supports(&self, factor: Factor) -> bool {
        self.pro.contains(&factor) || self.free.contains(&factor)
    }
}

/// Catalogues shipped with the engine.
pub mod catalogue {
    use super::{Catalogue, Factor};

    /// Rental apartments.
    pub const APARTMENTS: Catalogue = Catalogue {
        product: "apartments",
        free: &[Factor::Price, Factor::Distance],
        pro: &[
            Factor::Price,
            Factor::NetEffectiveRent,
            Factor::TotalCost,
            Factor::SquareFootage,
            Factor::Distance,
            Factor::Bedrooms,
            Factor::Bathrooms,
            Factor::Discount,
            Factor::Parking,
            Factor::Utilities,
            Factor::View,
            Factor::Balcony,
        ],
        labels: &[
            (Factor::Price, "Rent"),
            (Factor::NetEffectiveRent, "Net Effective Rent"),
            (Factor::TotalCost, "Total Cost"),
            (Factor::SquareFootage, "Square Footage"),
            (Factor::Bedrooms, "Bedrooms"),
            (Factor::Bathrooms, "Bathrooms"),
            (Factor::Distance, "Location"),
            (Factor::Discount, "Discount"),
            (Factor::Parking, "Parking Cost"),
            (Factor::Utilities, "Utilities"),
            (Factor::View, "View Quality"),
            (Factor::Balcony, "Balcony"),
        ],
        anonymous_weights: &[(Factor::Price, 50), (Factor::Distance, 50)],
    };

    /// Homes for purchase.
    pub const HOMES: Catalogue = Catalogue {
        product: "homes",
        free: &[Factor::Price, Factor::SquareFootage],
        pro: &[
            Factor::Price,
            Factor::SquareFootage,
            Factor::Distance,
            Factor::HoaFees,
            Factor::PropertyTaxes,
            Factor::LotSize,
            Factor::YearBuilt,
            Factor::Bedrooms,
            Factor::Bathrooms,
        ],
        labels: &[
            (Factor::Price, "Price"),
            (Factor::SquareFootage, "Square Footage"),
            (Factor::Bedrooms, "Bedrooms"),
            (Factor::Bathrooms, "Bathrooms"),
            (Factor::Distance, "Location"),
            (Factor::HoaFees, "HOA Fees"),
            (Factor::PropertyTaxes, "Property Taxes"),
            (Factor::LotSize, "Lot Size"),
            (Factor::YearBuilt, "Year Built"),
        ],
        anonymous_weights: &[(Factor::Price, 50), (Factor::SquareFootage, 50)],
    };
}
