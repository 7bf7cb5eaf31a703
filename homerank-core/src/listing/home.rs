//! Homes for sale.

use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{FactorContext, Scorable};
use crate::normalize::round_to;
use crate::{Catalogue, Factor, ItemId, UserId, catalogue::HOMES};

/// A home listed for sale.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Home {
    /// Unique identifier.
    pub id: ItemId,
    /// Owning user.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Asking price.
    pub price: f64,
    /// Interior area in square feet.
    pub square_footage: u32,
    /// Bedroom count.
    #[cfg_attr(feature = "serde", serde(default))]
    pub bedrooms: u32,
    /// Bathroom count, allowing half baths.
    #[cfg_attr(feature = "serde", serde(default))]
    pub bathrooms: f64,
    /// Monthly homeowners' association fees.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hoa_fees: f64,
    /// Annual property taxes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub property_taxes: f64,
    /// Construction year, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub year_built: Option<u16>,
    /// Lot area in square feet, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub lot_size_sqft: Option<u32>,
    /// WGS84 position; `None` when ungeocoded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<Coord<f64>>,
}

impl Home {
    /// Construct a home with no fees, taxes, or optional attributes.
    #[must_use]
    pub fn new(
        id: ItemId,
        owner: UserId,
        name: impl Into<String>,
        price: f64,
        square_footage: u32,
    ) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            price,
            square_footage,
            bedrooms: 0,
            bathrooms: 0.0,
            hoa_fees: 0.0,
            property_taxes: 0.0,
            year_built: None,
            lot_size_sqft: None,
            location: None,
        }
    }

    /// Set the location while returning `self`.
    #[must_use]
    pub const fn at(mut self, location: Coord<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// HOA fees plus a twelfth of the annual taxes.
    ///
    /// # Examples
    /// ```
    /// use homerank_core::{Home, ItemId, UserId};
    ///
    /// let mut home = Home::new(ItemId(1), UserId(1), "Bungalow", 450_000.0, 1_600);
    /// home.hoa_fees = 200.0;
    /// home.property_taxes = 6_000.0;
    /// assert_eq!(home.total_monthly_cost(), 700.0);
    /// ```
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "annual taxes are spread monthly")]
    pub fn total_monthly_cost(&self) -> f64 {
        round_to(self.hoa_fees + self.property_taxes / 12.0, 2)
    }

    /// Asking price per square foot, or `None` when the area is zero.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "price is divided by area")]
    pub fn price_per_sqft(&self) -> Option<f64> {
        (self.square_footage > 0)
            .then(|| round_to(self.price / f64::from(self.square_footage), 2))
    }
}

impl Scorable for Home {
    const CATALOGUE: &'static Catalogue = &HOMES;

    fn id(&self) -> ItemId {
        self.id
    }

    fn owner(&self) -> UserId {
        self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<Coord<f64>> {
        self.location
    }

    fn factor_value(&self, factor: Factor, _context: &FactorContext) -> Option<f64> {
        match factor {
            Factor::Price => Some(self.price),
            Factor::SquareFootage => Some(f64::from(self.square_footage)),
            Factor::Bedrooms => Some(f64::from(self.bedrooms)),
            Factor::Bathrooms => Some(self.bathrooms),
            Factor::HoaFees => Some(self.hoa_fees),
            Factor::PropertyTaxes => Some(self.property_taxes),
            Factor::LotSize => self
                .lot_size_sqft
                .filter(|lot| *lot > 0)
                .map(f64::from),
            Factor::YearBuilt => self
                .year_built
                .filter(|year| *year > 0)
                .map(f64::from),
            Factor::NetEffectiveRent
            | Factor::TotalCost
            | Factor::Distance
            | Factor::Discount
            | Factor::Parking
            | Factor::Utilities
            | Factor::View
            | Factor::Balcony => None,
        }
    }
}
