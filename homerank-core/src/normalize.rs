//! Min-max normalisation of raw factor values into `0.0..=1.0`.
//!
//! [`normalize`] is total: degenerate extents yield `0.5` and non-finite
//! results collapse to `0.0`, so callers never need to handle an error.

/// Scale `value` linearly into `0.0..=1.0` against the dataset extent.
///
/// When `max <= min` every item is judged equally and `0.5` is returned.
/// With `invert` set, lower raw values score higher.
///
/// # Examples
/// ```
/// use homerank_core::normalize;
///
/// assert_eq!(normalize(1_500.0, 1_500.0, 3_000.0, true), 1.0);
/// assert_eq!(normalize(3_000.0, 1_500.0, 3_000.0, true), 0.0);
/// assert_eq!(normalize(42.0, 7.0, 7.0, false), 0.5);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "min-max scaling is floating point by definition"
)]
pub fn normalize(value: f64, min: f64, max: f64, invert: bool) -> f64 {
    if max <= min {
        return 0.5;
    }
    let scaled = (value - min) / (max - min);
    let oriented = if invert { 1.0 - scaled } else { scaled };
    if !oriented.is_finite() {
        return 0.0;
    }
    oriented.clamp(0.0, 1.0)
}

/// Observed `(min, max)` of one factor across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl Extent {
    /// Compute the extent of the finite values in `values`.
    ///
    /// Returns `None` when no finite value is present.
    ///
    /// # Examples
    /// ```
    /// use homerank_core::Extent;
    ///
    /// let extent = Extent::from_values([3.0, 1.0, 2.0]).expect("non-empty");
    /// assert_eq!((extent.min, extent.max), (1.0, 3.0));
    /// assert!(Extent::from_values(std::iter::empty()).is_none());
    /// ```
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |extent, value| {
                Some(match extent {
                    None => Self {
                        min: value,
                        max: value,
                    },
                    Some(Self { min, max }) => Self {
                        min: min.min(value),
                        max: max.max(value),
                    },
                })
            })
    }

    /// Normalise `value` against this extent.
    #[must_use]
    pub fn normalize(self, value: f64, invert: bool) -> f64 {
        normalize(value, self.min, self.max, invert)
    }
}

/// Round `value` half away from zero to `decimals` places.
///
/// # Examples
/// ```
/// use homerank_core::round_to;
///
/// assert_eq!(round_to(6.666, 1), 6.7);
/// assert_eq!(round_to(12.344, 2), 12.34);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "decimal rounding scales by a power of ten"
)]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
