//! Scoring output: composite scores, per-factor breakdowns and distances.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DistanceSummary, Factor, ItemId};

/// How one factor contributed to an item's score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorContribution {
    /// Factor this row describes.
    pub factor: Factor,
    /// Display label from the listing kind's catalogue.
    pub label: String,
    /// Renormalised weight as a whole percentage.
    pub weight_percent: u8,
    /// Normalised value on a `0.0..=10.0` scale, one decimal.
    pub normalized_score: f64,
    /// Weighted share of the final score on a `0.0..=10.0` scale, one decimal.
    pub contribution: f64,
}

/// Result of scoring one batch of listings.
///
/// Items without any applicable factor have no entry in `scores` or
/// `breakdowns`; that is not an error.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evaluation {
    /// Scored items in input order, including unscored ones.
    pub items: Vec<ItemId>,
    /// Composite score per item in `0.0..=10.0`, one decimal.
    pub scores: BTreeMap<ItemId, f64>,
    /// Factor rows per item, heaviest weight first.
    pub breakdowns: BTreeMap<ItemId, Vec<FactorContribution>>,
    /// Distance view per item.
    pub distances: BTreeMap<ItemId, DistanceSummary>,
}

impl Evaluation {
    /// Score for `item`, if one was computable.
    #[must_use]
    pub fn score(&self, item: ItemId) -> Option<f64> {
        self.scores.get(&item).copied()
    }

    /// Item ids ordered by score, highest first.
    ///
    /// Ties keep input order and unscored items come last.
    ///
    /// # Examples
    /// ```
    /// use std::collections::BTreeMap;
    /// use homerank_core::{Evaluation, ItemId};
    ///
    /// let evaluation = Evaluation {
    ///     items: vec![ItemId(1), ItemId(2), ItemId(3)],
    ///     scores: BTreeMap::from([(ItemId(1), 4.0), (ItemId(3), 9.5)]),
    ///     ..Evaluation::default()
    /// };
    /// assert_eq!(evaluation.ranked(), vec![ItemId(3), ItemId(1), ItemId(2)]);
    /// ```
    #[must_use]
    pub fn ranked(&self) -> Vec<ItemId> {
        let mut ranked = self.items.clone();
        ranked.sort_by(|a, b| {
            let left = self.score(*a).unwrap_or(f64::NEG_INFINITY);
            let right = self.score(*b).unwrap_or(f64::NEG_INFINITY);
            right.total_cmp(&left)
        });
        ranked
    }
}
