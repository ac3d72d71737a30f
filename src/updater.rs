//! Cheapest Price Updater
//!
//! Write-side driver run by the product indexer: decides which variants contribute, computes
//! the cheapest price for every configured currency and rule chain, and stores the results in
//! a [`CheapestPriceContainer`].

use std::collections::BTreeMap;

use tracing::{Span, warn};

use crate::{
    cheapest::{CheapestPriceCalculator, CheapestPriceContainer, PriceError},
    config::UpdaterConfig,
    products::{EntityId, PricedEntity, ProductTree},
};

/// Computes cheapest price containers for product trees.
#[derive(Debug, Clone, Default)]
pub struct CheapestPriceUpdater {
    config: UpdaterConfig,
}

impl CheapestPriceUpdater {
    /// Create an updater from a validated config.
    pub fn new(config: UpdaterConfig) -> Self {
        Self { config }
    }

    /// The updater config.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Check if a variant contributes to the cheapest price under the current config.
    pub fn contributes(&self, variant: &PricedEntity) -> bool {
        let availability = variant.availability();

        if self.config.hide_closeout_when_out_of_stock && availability.is_sold_out_closeout() {
            return false;
        }

        self.config
            .sales_channels
            .as_deref()
            .is_none_or(|channels| channels.is_empty() || availability.visible_in_any(channels))
    }

    /// Compute the container of one product.
    ///
    /// Currencies the product has no price in are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if a price cannot be calculated.
    #[tracing::instrument(
        name = "cheapest.updater.update",
        skip(self, tree),
        fields(
            product = %tree.parent().id(),
            contributing_variants = tracing::field::Empty,
            entries = tracing::field::Empty
        ),
        err
    )]
    pub fn update(&self, tree: &ProductTree) -> Result<CheapestPriceContainer, PriceError> {
        let span = Span::current();
        let tree = tree.retain_variants(|variant| self.contributes(variant));

        span.record("contributing_variants", tree.variants().len());

        let mut container = CheapestPriceContainer::new();

        'currencies: for currency in &self.config.currencies {
            for rule_chain in &self.config.rule_chains {
                match CheapestPriceCalculator::compute_cheapest(&tree, currency, rule_chain, 1) {
                    Ok(Some(price)) => container.insert(rule_chain.clone(), &price),
                    Ok(None) => {}
                    Err(PriceError::NoPriceInCurrency(code)) => {
                        warn!(currency = code, "product has no price in currency, skipping");

                        continue 'currencies;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        span.record("entries", container.len());

        Ok(container)
    }

    /// Compute containers for a batch of products, keyed by parent identifier.
    ///
    /// # Errors
    ///
    /// Returns the first [`PriceError`] raised by any product.
    pub fn update_batch<'t>(
        &self,
        trees: impl IntoIterator<Item = &'t ProductTree>,
    ) -> Result<BTreeMap<EntityId, CheapestPriceContainer>, PriceError> {
        trees
            .into_iter()
            .map(|tree| Ok((tree.parent().id().clone(), self.update(tree)?)))
            .collect()
    }
}
