//! Prices
//!
//! Raw price candidates and the tier lists built from them.

use rusty_money::{Money, iso::Currency};

use crate::rules::RuleId;

/// One raw price row attached to a product or variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCandidate {
    rule: Option<RuleId>,
    quantity_start: u32,
    gross: Money<'static, Currency>,
    net: Money<'static, Currency>,
    list_price: Option<Money<'static, Currency>>,
}

impl PriceCandidate {
    /// Create a new candidate without a list price.
    ///
    /// `rule` is `None` for the default (rule-less) price.
    pub fn new(
        rule: Option<RuleId>,
        quantity_start: u32,
        gross: Money<'static, Currency>,
        net: Money<'static, Currency>,
    ) -> Self {
        Self {
            rule,
            quantity_start,
            gross,
            net,
            list_price: None,
        }
    }

    /// Attach a gross list (reference) price.
    #[must_use]
    pub fn with_list_price(mut self, list_price: Money<'static, Currency>) -> Self {
        self.list_price = Some(list_price);
        self
    }

    /// Rule the price belongs to, `None` for the default price.
    pub fn rule(&self) -> Option<&RuleId> {
        self.rule.as_ref()
    }

    /// Smallest order quantity the price applies to.
    pub fn quantity_start(&self) -> u32 {
        self.quantity_start
    }

    /// Gross amount.
    pub fn gross(&self) -> &Money<'static, Currency> {
        &self.gross
    }

    /// Net amount.
    pub fn net(&self) -> &Money<'static, Currency> {
        &self.net
    }

    /// Gross list price, if any.
    pub fn list_price(&self) -> Option<&Money<'static, Currency>> {
        self.list_price.as_ref()
    }

    /// Currency the candidate is denominated in.
    pub fn currency(&self) -> &'static Currency {
        self.gross.currency()
    }
}

/// A resolved price tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityPrice {
    /// Smallest order quantity the tier applies to.
    pub quantity_start: u32,

    /// Gross unit price.
    pub gross: Money<'static, Currency>,

    /// Net unit price.
    pub net: Money<'static, Currency>,

    /// Gross list price.
    pub list_price: Option<Money<'static, Currency>>,
}

impl From<&PriceCandidate> for QuantityPrice {
    fn from(candidate: &PriceCandidate) -> Self {
        Self {
            quantity_start: candidate.quantity_start,
            gross: candidate.gross,
            net: candidate.net,
            list_price: candidate.list_price,
        }
    }
}

impl QuantityPrice {
    fn same_amounts(&self, other: &Self) -> bool {
        self.gross == other.gross && self.net == other.net && self.list_price == other.list_price
    }
}

/// Build an ascending tier list, dropping tiers that repeat their predecessor's amounts.
pub fn tiers<'c>(candidates: impl IntoIterator<Item = &'c PriceCandidate>) -> Vec<QuantityPrice> {
    let mut sorted: Vec<QuantityPrice> = candidates.into_iter().map(QuantityPrice::from).collect();
    sorted.sort_by_key(|tier| tier.quantity_start);

    let mut tiers: Vec<QuantityPrice> = Vec::with_capacity(sorted.len());

    for tier in sorted {
        if tiers.last().is_some_and(|last| last.same_amounts(&tier)) {
            continue;
        }

        tiers.push(tier);
    }

    tiers
}

/// Pick the tier with the greatest quantity start not exceeding `quantity`.
///
/// Quantities below every start fall back to the first tier.
pub fn tier_for_quantity(tiers: &[QuantityPrice], quantity: u32) -> Option<&QuantityPrice> {
    tiers
        .iter()
        .rev()
        .find(|tier| tier.quantity_start <= quantity)
        .or_else(|| tiers.first())
}
