//! Per-user scoring preferences and the store that provides them.
//!
//! Weights are integers in `0..=100`; zero (or absence) disables a factor.
//! Weights are independent of each other until the
//! [`weights`](crate::weights) module normalises them.

use std::collections::BTreeMap;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Catalogue, Factor, ParseFactorError, StoreError, UserId};

/// Largest accepted factor weight.
pub const MAX_WEIGHT: u8 = 100;

/// Weight given to price, size, and distance in a freshly created set.
pub const DEFAULT_WEIGHT: u8 = 50;

/// How free weeks and months are converted into a dollar concession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DiscountCalculation {
    /// Prorate by the daily rate (`price * 12 / 365`).
    Daily,
    /// Prorate by the weekly rate (`price * 12 / 52`).
    #[default]
    Weekly,
    /// Count whole months, with a week worth a quarter month.
    Monthly,
}

/// Which monthly amount feeds the price-per-square-foot figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PriceBasis {
    /// Headline rent.
    Base,
    /// Rent after concessions.
    #[default]
    NetEffective,
    /// Rent after concessions plus parking and utilities.
    TotalCost,
}

/// Discrete choices that affect derived listing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivationChoices {
    /// Concession proration rule.
    pub discount_calculation: DiscountCalculation,
    /// Price-per-square-foot basis.
    pub price_basis: PriceBasis,
}

/// Errors raised when editing a [`PreferenceSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    /// The weight exceeded [`MAX_WEIGHT`].
    #[error("weight {weight} for {factor} exceeds {MAX_WEIGHT}")]
    WeightOutOfRange {
        /// Factor being configured.
        factor: Factor,
        /// Rejected weight.
        weight: u8,
    },
    /// The factor order listed the same factor twice.
    #[error("factor {factor} appears more than once in the display order")]
    DuplicateOrder {
        /// Repeated factor.
        factor: Factor,
    },
    /// A stored or submitted set named a factor this build does not know.
    #[error("unknown factor '{key}'")]
    UnknownFactor {
        /// Rejected key.
        key: String,
    },
}

impl From<ParseFactorError> for PreferenceError {
    fn from(err: ParseFactorError) -> Self {
        Self::UnknownFactor { key: err.key }
    }
}

/// Per-user scoring configuration for one product.
///
/// # Examples
/// ```
/// use homerank_core::{Factor, PreferenceSet, catalogue::APARTMENTS};
///
/// # fn main() -> Result<(), homerank_core::PreferenceError> {
/// let prefs = PreferenceSet::documented_default(&APARTMENTS).with_weight(Factor::View, 80)?;
/// assert_eq!(prefs.weight(Factor::Price), 50);
/// assert_eq!(prefs.weight(Factor::View), 80);
/// assert_eq!(prefs.weight(Factor::Balcony), 0);
/// # Ok(())
/// # }
/// ```
///
/// Deserialising goes through [`PreferenceSet::set_weight`] and
/// [`PreferenceSet::set_factor_order`], so payloads with out-of-range weights,
/// repeated factors, or unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PreferenceSet {
    weights: BTreeMap<Factor, u8>,
    /// Concession proration rule.
    pub discount_calculation: DiscountCalculation,
    /// Price-per-square-foot basis.
    pub price_basis: PriceBasis,
    factor_order: Vec<Factor>,
}

/// Wire shape of a [`PreferenceSet`] before validation.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPreferenceSet {
    #[serde(default)]
    weights: BTreeMap<String, u8>,
    #[serde(default)]
    discount_calculation: DiscountCalculation,
    #[serde(default)]
    price_basis: PriceBasis,
    #[serde(default)]
    factor_order: Vec<String>,
}

#[cfg(feature = "serde")]
impl RawPreferenceSet {
    fn validate(self) -> Result<PreferenceSet, PreferenceError> {
        let mut prefs = PreferenceSet {
            discount_calculation: self.discount_calculation,
            price_basis: self.price_basis,
            ..PreferenceSet::default()
        };
        for (key, weight) in self.weights {
            prefs.set_weight(key.parse()?, weight)?;
        }
        let order = self
            .factor_order
            .iter()
            .map(|key| key.parse::<Factor>())
            .collect::<Result<Vec<_>, _>>()?;
        prefs.set_factor_order(order)?;
        Ok(prefs)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for PreferenceSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawPreferenceSet::deserialize(deserializer)?
            .validate()
            .map_err(serde::de::Error::custom)
    }
}

impl PreferenceSet {
    /// Construct a set with every factor disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults created the first time a user is scored.
    ///
    /// Price, square footage, and distance start at [`DEFAULT_WEIGHT`]; every
    /// other factor starts disabled. Concessions are prorated weekly and price
    /// per square foot uses net effective rent. The display order follows the
    /// catalogue's pro-tier list.
    #[must_use]
    pub fn documented_default(catalogue: &Catalogue) -> Self {
        let weights = [Factor::Price, Factor::SquareFootage, Factor::Distance]
            .into_iter()
            .map(|factor| (factor, DEFAULT_WEIGHT))
            .collect();
        Self {
            weights,
            discount_calculation: DiscountCalculation::Weekly,
            price_basis: PriceBasis::NetEffective,
            factor_order: catalogue.pro.to_vec(),
        }
    }

    /// The fixed weights used for visitors who are not signed in.
    #[must_use]
    pub fn anonymous(catalogue: &Catalogue) -> Self {
        Self {
            weights: catalogue.anonymous_weights.iter().copied().collect(),
            factor_order: catalogue.pro.to_vec(),
            ..Self::default()
        }
    }

    /// Return the configured weight for `factor`, or `0` when unset.
    #[must_use]
    pub fn weight(&self, factor: Factor) -> u8 {
        self.weights.get(&factor).copied().unwrap_or(0)
    }

    /// Set the weight for `factor`.
    ///
    /// # Errors
    /// Returns [`PreferenceError::WeightOutOfRange`] when `weight` exceeds
    /// [`MAX_WEIGHT`].
    pub fn set_weight(&mut self, factor: Factor, weight: u8) -> Result<(), PreferenceError> {
        if weight > MAX_WEIGHT {
            return Err(PreferenceError::WeightOutOfRange { factor, weight });
        }
        if weight == 0 {
            self.weights.remove(&factor);
        } else {
            self.weights.insert(factor, weight);
        }
        Ok(())
    }

    /// Set a weight while returning `self` for chaining.
    ///
    /// # Errors
    /// See [`PreferenceSet::set_weight`].
    pub fn with_weight(mut self, factor: Factor, weight: u8) -> Result<Self, PreferenceError> {
        self.set_weight(factor, weight)?;
        Ok(self)
    }

    /// Iterate over factors with a strictly positive weight.
    pub fn enabled(&self) -> impl Iterator<Item = (Factor, u8)> + '_ {
        self.weights
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(factor, weight)| (*factor, *weight))
    }

    /// Preferred display order of factors in the preferences UI.
    #[must_use]
    pub fn factor_order(&self) -> &[Factor] {
        &self.factor_order
    }

    /// Replace the display order.
    ///
    /// # Errors
    /// Returns [`PreferenceError::DuplicateOrder`] when a factor repeats.
    pub fn set_factor_order(&mut self, order: Vec<Factor>) -> Result<(), PreferenceError> {
        let mut seen = Vec::with_capacity(order.len());
        for factor in &order {
            if seen.contains(factor) {
                return Err(PreferenceError::DuplicateOrder { factor: *factor });
            }
            seen.push(*factor);
        }
        self.factor_order = order;
        Ok(())
    }

    /// Choices that feed derived listing values.
    #[must_use]
    pub const fn choices(&self) -> DerivationChoices {
        DerivationChoices {
            discount_calculation: self.discount_calculation,
            price_basis: self.price_basis,
        }
    }
}

/// Persistent access to preference sets, one per user and product.
pub trait PreferenceStore: Send + Sync {
    /// Return the user's preferences, creating
    /// [`PreferenceSet::documented_default`] when none exist.
    ///
    /// Calling this repeatedly returns the same set until [`Self::save`]
    /// changes it.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be read or written.
    fn get_or_create_default(
        &self,
        user: UserId,
        catalogue: &Catalogue,
    ) -> Result<PreferenceSet, StoreError>;

    /// Persist `preferences` for the user, replacing any previous set.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be written.
    fn save(
        &self,
        user: UserId,
        catalogue: &Catalogue,
        preferences: &PreferenceSet,
    ) -> Result<(), StoreError>;
}
