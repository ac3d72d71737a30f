//! Cheapest Price
//!
//! The cheapest price of a product is the lowest price any of its parent or variants resolves
//! to for a currency and rule chain. It is computed on write by [`CheapestPriceCalculator`],
//! stored in a [`CheapestPriceContainer`] and resolved per request.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, list_price_percentage},
    prices::{QuantityPrice, tier_for_quantity},
    products::EntityId,
    rules::RuleId,
};

pub mod calculator;
pub mod container;
pub mod payload;

pub use calculator::{CheapestPriceCalculator, ProductPrices};
pub use container::CheapestPriceContainer;

/// Errors raised while computing a cheapest price.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// The product has prices, but none in the requested currency.
    #[error("no price in currency {0}")]
    NoPriceInCurrency(&'static str),

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// A resolved price for one currency and rule chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    /// The parent or variant that produced the price.
    pub variant_id: EntityId,

    /// Rule the winning entity resolved to, `None` for its default price.
    pub rule: Option<RuleId>,

    /// Gross unit price for the resolved quantity.
    pub unit_price: Money<'static, Currency>,

    /// Net unit price for the resolved quantity.
    pub unit_net: Money<'static, Currency>,

    /// Gross list price for the resolved quantity.
    pub list_price: Option<Money<'static, Currency>>,

    /// Tiers of the winning entity, ascending by quantity start.
    pub quantity_prices: Vec<QuantityPrice>,

    /// Discount against the list price in percent.
    pub percentage: Option<Decimal>,

    /// Whether a "from" price should be shown.
    pub has_range: bool,
}

impl ResolvedPrice {
    /// Build a price from the winning entity's tiers, applied at `quantity`.
    ///
    /// Returns `None` when there are no tiers.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage cannot be calculated.
    pub fn from_tiers(
        variant_id: EntityId,
        rule: Option<RuleId>,
        quantity_prices: Vec<QuantityPrice>,
        has_range: bool,
        quantity: u32,
    ) -> Result<Option<Self>, DiscountError> {
        let Some(tier) = tier_for_quantity(&quantity_prices, quantity).copied() else {
            return Ok(None);
        };

        let percentage = list_price_percentage(&tier.gross, tier.list_price.as_ref())?;

        Ok(Some(Self {
            variant_id,
            rule,
            unit_price: tier.gross,
            unit_net: tier.net,
            list_price: tier.list_price,
            quantity_prices,
            percentage,
            has_range,
        }))
    }

    /// Re-apply the stored tiers at another quantity.
    ///
    /// Prices without tiers keep their unit price.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage cannot be calculated.
    pub fn at_quantity(&self, quantity: u32) -> Result<Self, DiscountError> {
        let mut price = self.clone();

        if let Some(tier) = tier_for_quantity(&self.quantity_prices, quantity) {
            price.unit_price = tier.gross;
            price.unit_net = tier.net;
            price.list_price = tier.list_price;
        }

        price.percentage = list_price_percentage(&price.unit_price, price.list_price.as_ref())?;

        Ok(price)
    }

    /// The base price, i.e. the first tier (or the unit price without tiers).
    pub fn base_price(&self) -> &Money<'static, Currency> {
        self.quantity_prices
            .first()
            .map_or(&self.unit_price, |tier| &tier.gross)
    }

    /// Currency of the price.
    pub fn currency(&self) -> &'static Currency {
        self.unit_price.currency()
    }

    /// The list-price discount as a fraction.
    pub fn discount(&self) -> Option<Percentage> {
        self.percentage
            .map(|percentage| Percentage::from(percentage / Decimal::ONE_HUNDRED))
    }
}
