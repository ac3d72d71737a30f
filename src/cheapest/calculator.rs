//! Cheapest Price Calculator

use std::cmp::Ordering;

use rusty_money::iso::Currency;
use tracing::debug;

use crate::{
    cheapest::{PriceError, ResolvedPrice},
    context::PriceContext,
    prices::{QuantityPrice, tiers},
    products::{EntityId, PricedEntity, ProductTree},
    rules::{AppliedRule, RuleChain, RuleId, select_applicable_rule},
};

/// The price an entity resolved to.
#[derive(Debug)]
struct Participant<'t> {
    id: &'t EntityId,
    is_parent: bool,
    rule: Option<RuleId>,
    tiers: Vec<QuantityPrice>,
}

impl Participant<'_> {
    fn base_minor(&self) -> Option<i64> {
        self.tiers.first().map(|tier| tier.gross.to_minor_units())
    }

    /// Cheaper base price first, then parent before variants, then lower identifier.
    fn precedence(&self, other: &Self) -> Ordering {
        self.base_minor()
            .cmp(&other.base_minor())
            .then_with(|| other.is_parent.cmp(&self.is_parent))
            .then_with(|| self.id.cmp(other.id))
    }
}

/// Prices of a product as shown in a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPrices {
    /// The parent's own default price.
    pub price: Option<ResolvedPrice>,

    /// The cheapest price across the parent and its variants for the context.
    pub cheapest: Option<ResolvedPrice>,
}

/// Computes cheapest prices over a [`ProductTree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestPriceCalculator;

impl CheapestPriceCalculator {
    /// Compute the cheapest price across the active parent and variants.
    ///
    /// Every entity resolves its own rule from the chain; the entity with the lowest base price
    /// wins and its tiers are applied at `quantity`. Stock levels are not considered.
    ///
    /// Returns `Ok(None)` when no entity has a price for the chain.
    ///
    /// # Errors
    ///
    /// - [`PriceError::NoPriceInCurrency`]: the tree has prices, but none in `currency`.
    /// - [`PriceError::Discount`]: the list-price percentage could not be calculated.
    #[tracing::instrument(
        name = "cheapest.calculator.compute_cheapest",
        skip(tree, currency, rule_chain),
        fields(
            product = %tree.parent().id(),
            currency = currency.iso_alpha_code,
            rule_chain = %rule_chain,
            variants = tree.variants().len()
        ),
        err
    )]
    pub fn compute_cheapest(
        tree: &ProductTree,
        currency: &'static Currency,
        rule_chain: &RuleChain,
        quantity: u32,
    ) -> Result<Option<ResolvedPrice>, PriceError> {
        if !Self::has_prices(tree, currency)? {
            return Ok(None);
        }

        // An inactive parent still passes its prices down to its variants.
        let participants: Vec<Participant<'_>> = std::iter::once(tree.parent())
            .chain(tree.variants())
            .filter(|entity| entity.availability().active)
            .filter_map(|entity| Self::participant(tree, entity, currency, rule_chain))
            .collect();

        let Some(winner) = participants.iter().min_by(|a, b| a.precedence(b)) else {
            return Ok(None);
        };

        let has_range = winner.tiers.len() > 1
            || participants
                .iter()
                .any(|participant| participant.base_minor() != winner.base_minor());

        debug!(
            winner = %winner.id,
            rule = winner.rule.as_ref().map(RuleId::as_str),
            participants = participants.len(),
            has_range,
            "resolved cheapest price"
        );

        Ok(ResolvedPrice::from_tiers(
            winner.id.clone(),
            winner.rule.clone(),
            winner.tiers.clone(),
            has_range,
            quantity,
        )?)
    }

    /// Compute the price of a single entity in isolation, inheriting from the parent for
    /// variants.
    ///
    /// # Errors
    ///
    /// - [`PriceError::NoPriceInCurrency`]: the tree has prices, but none in `currency`.
    /// - [`PriceError::Discount`]: the list-price percentage could not be calculated.
    pub fn compute_own_price(
        tree: &ProductTree,
        entity: &PricedEntity,
        currency: &'static Currency,
        rule_chain: &RuleChain,
        quantity: u32,
    ) -> Result<Option<ResolvedPrice>, PriceError> {
        if !Self::has_prices(tree, currency)? {
            return Ok(None);
        }

        let Some(participant) = Self::participant(tree, entity, currency, rule_chain) else {
            return Ok(None);
        };

        let has_range = participant.tiers.len() > 1;

        Ok(ResolvedPrice::from_tiers(
            participant.id.clone(),
            participant.rule,
            participant.tiers,
            has_range,
            quantity,
        )?)
    }

    /// Compute the listing prices of a product for a context.
    ///
    /// `price` is the parent's own default price, independent of the active rules; `cheapest`
    /// honours the context's rule chain across all variants.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if either price cannot be computed.
    pub fn evaluate(tree: &ProductTree, context: &PriceContext) -> Result<ProductPrices, PriceError> {
        let price = Self::compute_own_price(
            tree,
            tree.parent(),
            context.currency,
            &RuleChain::empty(),
            context.quantity,
        )?;

        let cheapest = Self::compute_cheapest(
            tree,
            context.currency,
            &context.rule_chain,
            context.quantity,
        )?;

        Ok(ProductPrices { price, cheapest })
    }

    /// `Ok(false)` for a tree without any price, an error when only other currencies are priced.
    fn has_prices(tree: &ProductTree, currency: &'static Currency) -> Result<bool, PriceError> {
        if tree.has_no_candidates() {
            return Ok(false);
        }

        if !tree.has_currency(currency) {
            return Err(PriceError::NoPriceInCurrency(currency.iso_alpha_code));
        }

        Ok(true)
    }

    fn participant<'t>(
        tree: &'t ProductTree,
        entity: &'t PricedEntity,
        currency: &Currency,
        rule_chain: &RuleChain,
    ) -> Option<Participant<'t>> {
        let groups = tree.effective_candidates(entity, currency);
        let applied = select_applicable_rule(&groups, rule_chain)?;
        let tiers = tiers(groups.get(&applied.rule())?.iter().copied());

        Some(Participant {
            id: entity.id(),
            is_parent: entity.id() == tree.parent().id(),
            rule: match applied {
                AppliedRule::Rule(rule) => Some(rule),
                AppliedRule::Default => None,
            },
            tiers,
        })
    }
}
