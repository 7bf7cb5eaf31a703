//! Pure batch scoring.

use std::collections::BTreeMap;

use super::report::{Evaluation, FactorContribution};
use crate::normalize::round_to;
use crate::weights::applicable_weights;
use crate::{
    DerivationChoices, DistanceSummary, Extent, Factor, FactorContext, ItemId, Scorable,
};

/// Score `items` against the active weights.
///
/// Distance values come from `distances` (the per-item averages); every other
/// factor comes from [`Scorable::factor_value`]. Each factor is normalised
/// against the extent of the items that have a value for it, and each item's
/// weights are renormalised over the factors it has data for.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use homerank_core::{
///     Apartment, DerivationChoices, Factor, ItemId, UserId, score_items,
/// };
///
/// let items = [
///     Apartment::new(ItemId(1), UserId(1), "Cheap", 1_500.0, 600),
///     Apartment::new(ItemId(2), UserId(1), "Dear", 3_000.0, 900),
/// ];
/// let active = BTreeMap::from([(Factor::Price, 50_u8)]);
/// let evaluation = score_items(&items, &active, DerivationChoices::default(), &BTreeMap::new());
/// assert_eq!(evaluation.score(ItemId(1)), Some(10.0));
/// assert_eq!(evaluation.score(ItemId(2)), Some(0.0));
/// ```
#[must_use]
pub fn score_items<T: Scorable>(
    items: &[T],
    active: &BTreeMap<Factor, u8>,
    choices: DerivationChoices,
    distances: &BTreeMap<ItemId, DistanceSummary>,
) -> Evaluation {
    let context = FactorContext {
        choices,
        batch_has_discount: items.iter().any(|item| item.carries_discount(&choices)),
    };
    let value = |item: &T, factor: Factor| -> Option<f64> {
        let raw = if factor == Factor::Distance {
            distances
                .get(&item.id())
                .and_then(|summary| summary.average_distance)
        } else {
            item.factor_value(factor, &context)
        };
        raw.filter(|value| value.is_finite())
    };

    let extents: BTreeMap<Factor, Extent> = active
        .keys()
        .filter_map(|factor| {
            Extent::from_values(items.iter().filter_map(|item| value(item, *factor)))
                .map(|extent| (*factor, extent))
        })
        .collect();

    let mut evaluation = Evaluation {
        items: items.iter().map(T::id).collect(),
        distances: distances.clone(),
        ..Evaluation::default()
    };
    for item in items {
        let values: BTreeMap<Factor, f64> = active
            .keys()
            .filter_map(|factor| value(item, *factor).map(|raw| (*factor, raw)))
            .collect();
        let weights = applicable_weights(active, |factor| values.contains_key(&factor));
        if weights.is_empty() {
            continue;
        }
        let mut composite = 0.0;
        let mut rows = Vec::with_capacity(weights.len());
        for (factor, weight) in &weights {
            let (Some(raw), Some(extent)) = (values.get(factor), extents.get(factor)) else {
                continue;
            };
            let normalized = extent.normalize(*raw, factor.inverted());
            composite = accumulate(composite, normalized, *weight);
            rows.push(contribution::<T>(*factor, *weight, normalized));
        }
        rows.sort_by(|a, b| b.weight_percent.cmp(&a.weight_percent));
        evaluation
            .scores
            .insert(item.id(), round_to(scale(composite), 1));
        evaluation.breakdowns.insert(item.id(), rows);
    }
    evaluation
}

#[expect(clippy::float_arithmetic, reason = "weighted sum")]
fn accumulate(total: f64, normalized: f64, weight: f64) -> f64 {
    total + normalized * weight
}

#[expect(clippy::float_arithmetic, reason = "scores are reported out of ten")]
fn scale(unit: f64) -> f64 {
    unit * 10.0
}

#[expect(clippy::float_arithmetic, reason = "weights are reported as percentages")]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is rounded and clamped to 0..=100"
)]
fn percent(weight: f64) -> u8 {
    round_to(weight * 100.0, 0).clamp(0.0, 100.0) as u8
}

#[expect(clippy::float_arithmetic, reason = "contribution is normalised value times weight")]
fn contribution<T: Scorable>(factor: Factor, weight: f64, normalized: f64) -> FactorContribution {
    FactorContribution {
        factor,
        label: T::CATALOGUE.label(factor).to_owned(),
        weight_percent: percent(weight),
        normalized_score: round_to(scale(normalized), 1),
        contribution: round_to(scale(normalized * weight), 1),
    }
}
