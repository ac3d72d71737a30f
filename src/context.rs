//! Price Context

use rusty_money::iso::Currency;

use crate::rules::RuleChain;

/// The request-side inputs a price is resolved for.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceContext {
    /// Requested currency.
    pub currency: &'static Currency,

    /// Active rules, most preferred first.
    pub rule_chain: RuleChain,

    /// Order quantity, at least 1.
    pub quantity: u32,
}

impl PriceContext {
    /// Context for a single unit without any active rule.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            rule_chain: RuleChain::empty(),
            quantity: 1,
        }
    }

    /// Set the active rule chain.
    #[must_use]
    pub fn with_rules(mut self, rule_chain: RuleChain) -> Self {
        self.rule_chain = rule_chain;
        self
    }

    /// Set the order quantity. Zero is treated as one.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }
}
