//! Rental apartments and their derived rent figures.

use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{FactorContext, Scorable};
use crate::normalize::round_to;
use crate::{
    Catalogue, DerivationChoices, DiscountCalculation, Factor, ItemId, PriceBasis, UserId,
    catalogue::APARTMENTS,
};

/// Concessions smaller than half a cent are treated as absent.
const DISCOUNT_EPSILON: f64 = 0.005;

/// A rental apartment.
///
/// # Examples
/// ```
/// use homerank_core::{Apartment, DiscountCalculation, ItemId, UserId};
///
/// let mut apartment = Apartment::new(ItemId(1), UserId(1), "Loft", 2_000.0, 800);
/// apartment.lease_length_months = 12;
/// apartment.months_free = 1;
/// assert_eq!(apartment.net_effective_rent(DiscountCalculation::Monthly), 1_833.33);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Apartment {
    /// Unique identifier.
    pub id: ItemId,
    /// Owning user.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Monthly rent.
    pub price: f64,
    /// Interior area in square feet.
    pub square_footage: u32,
    /// Bedroom count; `0.5` denotes a studio alcove.
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub bedrooms: f64,
    /// Bathroom count.
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub bathrooms: f64,
    /// Lease length in months.
    #[cfg_attr(feature = "serde", serde(default = "twelve"))]
    pub lease_length_months: u32,
    /// Free months granted over the lease.
    #[cfg_attr(feature = "serde", serde(default))]
    pub months_free: u32,
    /// Free weeks granted over the lease.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weeks_free: u32,
    /// One-off dollar concession.
    #[cfg_attr(feature = "serde", serde(default))]
    pub flat_discount: f64,
    /// Monthly parking cost.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parking_cost: f64,
    /// Monthly utilities cost.
    #[cfg_attr(feature = "serde", serde(default))]
    pub utilities: f64,
    /// View rating from one to five; zero means unrated.
    #[cfg_attr(feature = "serde", serde(default))]
    pub view_quality: u8,
    /// Whether the unit has a balcony.
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_balcony: bool,
    /// WGS84 position; `None` when ungeocoded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<Coord<f64>>,
}

#[cfg(feature = "serde")]
const fn one() -> f64 {
    1.0
}

#[cfg(feature = "serde")]
const fn twelve() -> u32 {
    12
}

impl Apartment {
    /// Construct an apartment on a twelve-month lease with no concessions.
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
            bedrooms: 1.0,
            bathrooms: 1.0,
            lease_length_months: 12,
            months_free: 0,
            weeks_free: 0,
            flat_discount: 0.0,
            parking_cost: 0.0,
            utilities: 0.0,
            view_quality: 0,
            has_balcony: false,
            location: None,
        }
    }

    /// Set the location while returning `self`.
    #[must_use]
    pub const fn at(mut self, location: Coord<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Total dollar value of concessions over the lease.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "concessions are prorated from the monthly rent"
    )]
    pub fn total_discount(&self, calculation: DiscountCalculation) -> f64 {
        let months = f64::from(self.months_free);
        let weeks = f64::from(self.weeks_free);
        let prorated = match calculation {
            DiscountCalculation::Daily => {
                let daily_rate = self.price * 12.0 / 365.0;
                daily_rate * months * 365.0 / 12.0 + daily_rate * 7.0 * weeks
            }
            DiscountCalculation::Weekly => {
                let weekly_rate = self.price * 12.0 / 52.0;
                weekly_rate * months * 52.0 / 12.0 + weekly_rate * weeks
            }
            DiscountCalculation::Monthly => self.price * months + self.price * weeks / 4.0,
        };
        prorated + self.flat_discount
    }

    /// Monthly rent after concessions are spread over the lease, in cents.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "net rent divides the discounted lease value by its length"
    )]
    pub fn net_effective_rent(&self, calculation: DiscountCalculation) -> f64 {
        let lease = f64::from(self.lease_length_months.max(1));
        let net = (self.price * lease - self.total_discount(calculation)) / lease;
        round_to(net, 2)
    }

    /// Net effective rent plus parking and utilities.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "monthly costs are summed")]
    pub fn total_cost(&self, calculation: DiscountCalculation) -> f64 {
        round_to(
            self.net_effective_rent(calculation) + self.parking_cost + self.utilities,
            2,
        )
    }

    /// Monthly price per square foot under the chosen basis.
    ///
    /// Returns `None` when the square footage is zero.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "price is divided by area")]
    pub fn price_per_sqft(&self, choices: &DerivationChoices) -> Option<f64> {
        if self.square_footage == 0 {
            return None;
        }
        let price = match choices.price_basis {
            PriceBasis::Base => self.price,
            PriceBasis::NetEffective => self.net_effective_rent(choices.discount_calculation),
            PriceBasis::TotalCost => self.total_cost(choices.discount_calculation),
        };
        Some(round_to(price / f64::from(self.square_footage), 2))
    }
}

impl Scorable for Apartment {
    const CATALOGUE: &'static Catalogue = &APARTMENTS;

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

    fn factor_value(&self, factor: Factor, context: &FactorContext) -> Option<f64> {
        let calculation = context.choices.discount_calculation;
        match factor {
            Factor::Price if context.batch_has_discount => {
                Some(self.net_effective_rent(calculation))
            }
            Factor::Price => Some(self.price),
            Factor::NetEffectiveRent => Some(self.net_effective_rent(calculation)),
            Factor::TotalCost => Some(self.total_cost(calculation)),
            Factor::SquareFootage => Some(f64::from(self.square_footage)),
            Factor::Bedrooms => Some(self.bedrooms),
            Factor::Bathrooms => Some(self.bathrooms),
            Factor::Discount => Some(self.total_discount(calculation)),
            Factor::Parking => Some(self.parking_cost),
            Factor::Utilities => Some(self.utilities),
            Factor::View => (self.view_quality > 0).then(|| f64::from(self.view_quality)),
            Factor::Balcony => Some(if self.has_balcony { 1.0 } else { 0.0 }),
            Factor::Distance
            | Factor::HoaFees
            | Factor::PropertyTaxes
            | Factor::LotSize
            | Factor::YearBuilt => None,
        }
    }

    #[expect(clippy::float_arithmetic, reason = "compares net rent against base rent")]
    fn carries_discount(&self, choices: &DerivationChoices) -> bool {
        (self.net_effective_rent(choices.discount_calculation) - self.price).abs()
            >= DISCOUNT_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn discounted() -> Apartment {
        let mut apartment = Apartment::new(ItemId(1), UserId(1), "Tower", 2_600.0, 1_000);
        apartment.lease_length_months = 13;
        apartment.months_free = 1;
        apartment.weeks_free = 2;
        apartment.flat_discount = 100.0;
        apartment.parking_cost = 150.0;
        apartment.utilities = 80.0;
        apartment
    }

    #[rstest]
    #[case(DiscountCalculation::Daily, 2_600.0 + 2_600.0 * 12.0 / 365.0 * 14.0 + 100.0)]
    #[case(DiscountCalculation::Weekly, 2_600.0 + 2_600.0 * 12.0 / 52.0 * 2.0 + 100.0)]
    #[case(DiscountCalculation::Monthly, 2_600.0 + 1_300.0 + 100.0)]
    fn discount_follows_the_calculation(
        discounted: Apartment,
        #[case] calculation: DiscountCalculation,
        #[case] expected: f64,
    ) {
        assert!((discounted.total_discount(calculation) - expected).abs() < 1e-6);
    }

    #[rstest]
    fn net_rent_spreads_concessions_over_the_lease(discounted: Apartment) {
        // 2600 * 13 = 33800; monthly discount = 2600 + 1300 + 100 = 4000.
        assert_eq!(
            discounted.net_effective_rent(DiscountCalculation::Monthly),
            2_292.31
        );
        assert_eq!(discounted.total_cost(DiscountCalculation::Monthly), 2_522.31);
    }

    #[rstest]
    #[case(PriceBasis::Base, 2.6)]
    #[case(PriceBasis::NetEffective, 2.29)]
    #[case(PriceBasis::TotalCost, 2.52)]
    fn price_per_sqft_uses_the_basis(
        discounted: Apartment,
        #[case] basis: PriceBasis,
        #[case] expected: f64,
    ) {
        let choices = DerivationChoices {
            discount_calculation: DiscountCalculation::Monthly,
            price_basis: basis,
        };
        assert_eq!(discounted.price_per_sqft(&choices), Some(expected));
    }

    #[rstest]
    fn price_factor_switches_to_net_rent_when_the_batch_is_discounted(discounted: Apartment) {
        let plain = FactorContext::default();
        let batch = FactorContext {
            batch_has_discount: true,
            ..FactorContext::default()
        };
        assert_eq!(discounted.factor_value(Factor::Price, &plain), Some(2_600.0));
        assert_eq!(
            discounted.factor_value(Factor::Price, &batch),
            discounted.factor_value(Factor::NetEffectiveRent, &batch)
        );
    }

    #[rstest]
    fn unrated_view_is_unavailable(discounted: Apartment) {
        let context = FactorContext::default();
        assert_eq!(discounted.factor_value(Factor::View, &context), None);
        let rated = Apartment {
            view_quality: 4,
            ..discounted
        };
        assert_eq!(rated.factor_value(Factor::View, &context), Some(4.0));
    }

    #[rstest]
    fn distance_is_left_to_the_engine(discounted: Apartment) {
        assert_eq!(
            discounted.factor_value(Factor::Distance, &FactorContext::default()),
            None
        );
    }

    #[rstest]
    fn concessions_are_detected(discounted: Apartment) {
        let choices = DerivationChoices::default();
        assert!(discounted.carries_discount(&choices));
        let plain = Apartment::new(ItemId(2), UserId(1), "Plain", 1_999.99, 700);
        assert!(!plain.carries_discount(&choices));
    }
}
