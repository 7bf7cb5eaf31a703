//! Resolve raw preference weights into normalised, tier-gated weight sets.

use std::collections::BTreeMap;

use crate::{Factor, PreferenceSet};

/// Keep the factors in `allowed` whose configured weight is positive.
///
/// # Examples
/// ```
/// use homerank_core::{Factor, PreferenceSet, Tier, active_weights, catalogue::APARTMENTS};
///
/// let prefs = PreferenceSet::documented_default(&APARTMENTS);
/// let active = active_weights(&prefs, APARTMENTS.allowed(Tier::Free));
/// assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![Factor::Price, Factor::Distance]);
/// ```
#[must_use]
pub fn active_weights(preferences: &PreferenceSet, allowed: &[Factor]) -> BTreeMap<Factor, u8> {
    allowed
        .iter()
        .map(|factor| (*factor, preferences.weight(*factor)))
        .filter(|(_, weight)| *weight > 0)
        .collect()
}

/// Divide each weight by the total so the result sums to one.
///
/// Returns an empty map when the total is zero, which callers treat as
/// "no score computable".
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use homerank_core::normalize_weights;
///
/// let weights = BTreeMap::from([("price", 30_u8), ("sqft", 10)]);
/// let normalised = normalize_weights(&weights);
/// assert_eq!(normalised.get("price"), Some(&0.75));
/// assert!(normalize_weights(&BTreeMap::from([("price", 0_u8)])).is_empty());
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "weights are converted into fractions of their total"
)]
pub fn normalize_weights<K>(weights: &BTreeMap<K, u8>) -> BTreeMap<K, f64>
where
    K: Ord + Clone,
{
    let sum: u32 = weights.values().map(|weight| u32::from(*weight)).sum();
    if sum == 0 {
        return BTreeMap::new();
    }
    let total = f64::from(sum);
    weights
        .iter()
        .map(|(key, weight)| (key.clone(), f64::from(*weight) / total))
        .collect()
}

/// Renormalise `active` over only the factors for which `has_value` holds.
///
/// Items missing data for some factors are scored on the remainder without
/// being penalised for the gap.
#[must_use]
pub fn applicable_weights<F>(active: &BTreeMap<Factor, u8>, has_value: F) -> BTreeMap<Factor, f64>
where
    F: Fn(Factor) -> bool,
{
    let subset: BTreeMap<Factor, u8> = active
        .iter()
        .filter(|(factor, _)| has_value(**factor))
        .map(|(factor, weight)| (*factor, *weight))
        .collect();
    normalize_weights(&subset)
}
