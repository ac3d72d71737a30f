//! Cheapest Price Container
//!
//! Per-product cache of cheapest prices, keyed by currency and rule chain.

use std::collections::BTreeMap;

use rusty_money::{Money, iso::Currency};
use tracing::warn;

use crate::{
    cheapest::{
        ResolvedPrice,
        payload::{self, ContainerError, PayloadEntry, StoredPrice, StoredTier},
    },
    context::PriceContext,
    prices::QuantityPrice,
    products::EntityId,
    rules::{RuleChain, RuleId},
};

/// Cheapest prices of one product for every computed currency and rule chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheapestPriceContainer {
    prices: BTreeMap<String, BTreeMap<RuleChain, StoredPrice>>,
}

impl CheapestPriceContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the price computed for a rule chain, replacing any previous entry.
    pub fn insert(&mut self, rule_chain: RuleChain, price: &ResolvedPrice) {
        self.prices
            .entry(price.currency().iso_alpha_code.to_string())
            .or_default()
            .insert(rule_chain, StoredPrice::from(price));
    }

    /// The stored entry for an exact currency and rule chain.
    pub fn get(&self, currency: &Currency, rule_chain: &RuleChain) -> Option<&StoredPrice> {
        self.prices
            .get(currency.iso_alpha_code)
            .and_then(|chains| chains.get(rule_chain))
    }

    /// Resolve the price for a request context.
    ///
    /// Falls back from the context's rule chain to the default chain of the same currency.
    /// Returns `None` when neither exists, the stored entry has no unit price, or the entry
    /// cannot be priced (logged as a warning).
    pub fn resolve(&self, context: &PriceContext) -> Option<ResolvedPrice> {
        let stored = self
            .get(context.currency, &context.rule_chain)
            .or_else(|| self.get(context.currency, &RuleChain::empty()))?;

        stored
            .to_resolved(context.currency)?
            .at_quantity(context.quantity)
            .inspect_err(|error| {
                warn!(
                    currency = context.currency.iso_alpha_code,
                    rule_chain = %context.rule_chain,
                    quantity = context.quantity,
                    %error,
                    "skipping unresolvable stored price"
                );
            })
            .ok()
    }

    /// Currency codes with at least one entry.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }

    /// Iterate over every (currency code, rule chain, entry).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleChain, &StoredPrice)> {
        self.prices.iter().flat_map(|(currency, chains)| {
            chains
                .iter()
                .map(move |(chain, price)| (currency.as_str(), chain, price))
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.prices.values().map(BTreeMap::len).sum()
    }

    /// Check if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize with the current payload version.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ContainerError> {
        let entries = self
            .iter()
            .map(|(currency, chain, price)| PayloadEntry {
                currency: currency.to_string(),
                rules: chain.iter().map(ToString::to_string).collect(),
                price: price.clone(),
            })
            .collect();

        payload::encode(entries)
    }

    /// Deserialize a payload of any supported version.
    ///
    /// Missing optional fields are filled with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if the JSON is malformed or the version is unsupported.
    pub fn from_json(json: &str) -> Result<Self, ContainerError> {
        let mut container = Self::new();

        for entry in payload::decode(json)?.entries {
            let chain = entry.rules.into_iter().map(RuleId::new).collect();

            container
                .prices
                .entry(entry.currency.trim().to_ascii_uppercase())
                .or_default()
                .insert(chain, entry.price);
        }

        Ok(container)
    }
}

impl From<&ResolvedPrice> for StoredPrice {
    fn from(price: &ResolvedPrice) -> Self {
        let base = price.quantity_prices.first();

        Self {
            variant_id: Some(price.variant_id.to_string()),
            rule: price.rule.as_ref().map(ToString::to_string),
            unit_price: Some(price.base_price().to_minor_units()),
            unit_net: Some(base.map_or(price.unit_net, |tier| tier.net).to_minor_units()),
            list_price: base
                .map_or(price.list_price, |tier| tier.list_price)
                .map(|list| list.to_minor_units()),
            quantity_prices: price
                .quantity_prices
                .iter()
                .map(|tier| StoredTier {
                    quantity_start: tier.quantity_start,
                    gross: tier.gross.to_minor_units(),
                    net: Some(tier.net.to_minor_units()),
                    list_price: tier.list_price.map(|list| list.to_minor_units()),
                })
                .collect(),
            has_range: price.has_range,
        }
    }
}

impl StoredPrice {
    /// Rebuild a resolved price at its base quantity.
    ///
    /// Returns `None` without a unit price. Missing net prices fall back to the gross price.
    pub fn to_resolved(&self, currency: &'static Currency) -> Option<ResolvedPrice> {
        let unit_price = self.unit_price?;
        let money = |minor: i64| Money::from_minor(minor, currency);

        Some(ResolvedPrice {
            variant_id: EntityId::new(self.variant_id.clone().unwrap_or_default()),
            rule: self.rule.clone().map(RuleId::new),
            unit_price: money(unit_price),
            unit_net: money(self.unit_net.unwrap_or(unit_price)),
            list_price: self.list_price.map(money),
            quantity_prices: self
                .quantity_prices
                .iter()
                .map(|tier| QuantityPrice {
                    quantity_start: tier.quantity_start,
                    gross: money(tier.gross),
                    net: money(tier.net.unwrap_or(tier.gross)),
                    list_price: tier.list_price.map(money),
                })
                .collect(),
            percentage: None,
            has_range: self.has_range,
        })
    }
}
