//! Listing
//!
//! Read-side helpers over resolved cheapest prices: range filters, sorting and aggregations.

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cheapest::{CheapestPriceContainer, ResolvedPrice},
    context::PriceContext,
    products::EntityId,
};

/// Errors raised while aggregating listing prices.
#[derive(Debug, Error, PartialEq)]
pub enum ListingError {
    /// Products were priced in different currencies (index, product currency, expected currency).
    #[error("product {0} is priced in {1}, but the listing is in {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// The aggregated amounts overflowed.
    #[error("price aggregation overflowed")]
    Overflow,
}

/// A product in a listing together with its resolved price.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedProduct {
    /// Product identifier.
    pub id: EntityId,

    /// Resolved cheapest price, `None` for products without a price.
    pub price: Option<ResolvedPrice>,
}

impl ListedProduct {
    /// Resolve a product's stored container for a context.
    pub fn resolve(
        id: EntityId,
        container: &CheapestPriceContainer,
        context: &PriceContext,
    ) -> Self {
        Self {
            id,
            price: container.resolve(context),
        }
    }

    /// Value of `field`, in major units for prices.
    pub fn value(&self, field: PriceField) -> Option<Decimal> {
        let price = self.price.as_ref()?;

        Some(match field {
            PriceField::UnitPrice => *price.unit_price.amount(),
            PriceField::Percentage => price.percentage.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Price fields available for filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    /// Gross unit price.
    UnitPrice,

    /// List-price discount in percent.
    Percentage,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Lowest first.
    Ascending,

    /// Highest first.
    Descending,
}

/// Inclusive range filter on a price field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter {
    /// Field to filter on.
    pub field: PriceField,

    /// Lower bound (inclusive).
    pub min: Option<Decimal>,

    /// Upper bound (inclusive).
    pub max: Option<Decimal>,
}

impl RangeFilter {
    /// Create a filter on `field` without bounds.
    pub const fn new(field: PriceField) -> Self {
        Self {
            field,
            min: None,
            max: None,
        }
    }

    /// Set the lower bound.
    #[must_use]
    pub const fn gte(mut self, min: Decimal) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the upper bound.
    #[must_use]
    pub const fn lte(mut self, max: Decimal) -> Self {
        self.max = Some(max);
        self
    }

    /// Check if a product matches. Products without a price never match.
    pub fn matches(&self, product: &ListedProduct) -> bool {
        product.value(self.field).is_some_and(|value| {
            self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
        })
    }
}

/// Keep the products matching `filter`, preserving their order.
pub fn filter<'p>(products: &'p [ListedProduct], filter: &RangeFilter) -> Vec<&'p ListedProduct> {
    products
        .iter()
        .filter(|product| filter.matches(product))
        .collect()
}

/// Sort products by a price field.
///
/// Equal values are ordered by product identifier ascending and products without a price come
/// last in either direction.
pub fn sort(products: &mut [ListedProduct], field: PriceField, direction: SortDirection) {
    products.sort_by(|a, b| {
        let by_value = match (a.value(field), b.value(field)) {
            (Some(a), Some(b)) => match direction {
                SortDirection::Ascending => a.cmp(&b),
                SortDirection::Descending => b.cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_value.then_with(|| a.id.cmp(&b.id))
    });
}

/// Aggregated unit prices of a listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAggregation {
    /// Lowest unit price.
    pub min: Money<'static, Currency>,

    /// Highest unit price.
    pub max: Money<'static, Currency>,

    /// Average unit price, rounded to minor units.
    pub avg: Money<'static, Currency>,

    /// Sum of unit prices.
    pub sum: Money<'static, Currency>,

    /// Number of priced products.
    pub count: usize,
}

/// Aggregate the unit prices of all priced products.
///
/// Returns `None` when no product has a price.
///
/// # Errors
///
/// - [`ListingError::CurrencyMismatch`]: products are priced in different currencies.
/// - [`ListingError::Overflow`]: the sum cannot be represented.
pub fn aggregate(products: &[ListedProduct]) -> Result<Option<PriceAggregation>, ListingError> {
    let mut priced = products
        .iter()
        .enumerate()
        .filter_map(|(i, product)| product.price.as_ref().map(|price| (i, price)));

    let Some((_, first)) = priced.next() else {
        return Ok(None);
    };

    let currency = first.currency();
    let first_minor = first.unit_price.to_minor_units();
    let (mut min, mut max, mut sum, mut count) = (first_minor, first_minor, first_minor, 1_usize);

    for (i, price) in priced {
        if price.currency() != currency {
            return Err(ListingError::CurrencyMismatch(
                i,
                price.currency().iso_alpha_code,
                currency.iso_alpha_code,
            ));
        }

        let minor = price.unit_price.to_minor_units();

        min = min.min(minor);
        max = max.max(minor);
        sum = sum.checked_add(minor).ok_or(ListingError::Overflow)?;
        count += 1;
    }

    let avg = Decimal::from(sum)
        .checked_div(Decimal::from(count))
        .ok_or(ListingError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(ListingError::Overflow)?;

    Ok(Some(PriceAggregation {
        min: Money::from_minor(min, currency),
        max: Money::from_minor(max, currency),
        avg: Money::from_minor(avg, currency),
        sum: Money::from_minor(sum, currency),
        count,
    }))
}
