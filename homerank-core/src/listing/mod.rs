//! Listings the engine can rank and the capability they expose to it.
//!
//! The engine never inspects concrete listing types. It asks each item for a
//! factor value through [`Scorable::factor_value`]; `None` means the item has
//! no usable data for that factor and the factor is dropped for that item.

mod apartment;
mod home;

pub use apartment::Apartment;
pub use home::Home;

use geo::Coord;

use crate::{Catalogue, DerivationChoices, Factor, ItemId, UserId};

/// Batch-wide inputs to factor extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactorContext {
    /// Derivation choices from the viewer's preferences.
    pub choices: DerivationChoices,
    /// Whether any listing in the batch carries a concession.
    pub batch_has_discount: bool,
}

/// A listing that can be scored.
///
/// Implementations return raw, un-normalised values. The engine sources
/// [`Factor::Distance`] from the distance cache, so implementations should
/// return `None` for it.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use homerank_core::{
///     Catalogue, Factor, FactorContext, ItemId, Scorable, UserId, catalogue::HOMES,
/// };
///
/// struct Plot {
///     id: u64,
///     acres: f64,
/// }
///
/// impl Scorable for Plot {
///     const CATALOGUE: &'static Catalogue = &HOMES;
///
///     fn id(&self) -> ItemId {
///         ItemId(self.id)
///     }
///
///     fn owner(&self) -> UserId {
///         UserId(1)
///     }
///
///     fn name(&self) -> &str {
///         "plot"
///     }
///
///     fn location(&self) -> Option<Coord<f64>> {
///         None
///     }
///
///     fn factor_value(&self, factor: Factor, _context: &FactorContext) -> Option<f64> {
///         (factor == Factor::LotSize).then_some(self.acres)
///     }
/// }
///
/// let plot = Plot { id: 1, acres: 2.5 };
/// assert_eq!(plot.factor_value(Factor::LotSize, &FactorContext::default()), Some(2.5));
/// assert_eq!(plot.factor_value(Factor::Price, &FactorContext::default()), None);
/// ```
pub trait Scorable {
    /// Factor catalogue for this listing kind.
    const CATALOGUE: &'static Catalogue;

    /// Unique identifier.
    fn id(&self) -> ItemId;

    /// Owning user.
    fn owner(&self) -> UserId;

    /// Display name used in log messages.
    fn name(&self) -> &str;

    /// WGS84 position, or `None` when ungeocoded.
    fn location(&self) -> Option<Coord<f64>>;

    /// Raw value of `factor`, or `None` when unavailable for this item.
    fn factor_value(&self, factor: Factor, context: &FactorContext) -> Option<f64>;

    /// Whether the listing carries a concession under `choices`.
    fn carries_discount(&self, _choices: &DerivationChoices) -> bool {
        false
    }
}
