//! Products
//!
//! A [`ProductTree`] is a validated snapshot of a parent product, its variants and every
//! price candidate attached to them.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::iso::Currency;
use slotmap::new_key_type;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    prices::PriceCandidate,
    rules::CandidatesByRule,
};

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Identifier of a parent product or variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Sales channel identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SalesChannelId(String);

impl SalesChannelId {
    /// Create a new sales channel identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for SalesChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Availability flags supplied by the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Whether the entity is active.
    pub active: bool,

    /// Whether the entity is sold only while in stock.
    pub closeout: bool,

    /// Available stock.
    pub stock: i64,

    /// Sales channels the entity is visible in.
    pub sales_channels: SmallVec<[SalesChannelId; 2]>,
}

impl Availability {
    /// Check if the entity is out of stock while flagged as closeout.
    pub fn is_sold_out_closeout(&self) -> bool {
        self.closeout && self.stock <= 0
    }

    /// Check if the entity is visible in at least one of `channels`.
    pub fn visible_in_any(&self, channels: &[SalesChannelId]) -> bool {
        channels
            .iter()
            .any(|channel| self.sales_channels.contains(channel))
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            active: true,
            closeout: false,
            stock: 0,
            sales_channels: SmallVec::new(),
        }
    }
}

/// A parent product or variant with its own price candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedEntity {
    id: EntityId,
    availability: Availability,
    candidates: Vec<PriceCandidate>,
}

impl PricedEntity {
    /// Entity identifier.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Availability flags.
    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    /// Own price candidates.
    pub fn candidates(&self) -> &[PriceCandidate] {
        &self.candidates
    }

    /// Check if the entity has at least one candidate in `currency`.
    pub fn has_currency(&self, currency: &Currency) -> bool {
        self.candidates
            .iter()
            .any(|candidate| candidate.currency() == currency)
    }

    /// Own candidates in `currency`, grouped by rule.
    pub fn candidates_by_rule(&self, currency: &Currency) -> CandidatesByRule<'_> {
        let mut groups = CandidatesByRule::default();

        for candidate in self
            .candidates
            .iter()
            .filter(|candidate| candidate.currency() == currency)
        {
            groups
                .entry(candidate.rule())
                .or_default()
                .push(candidate);
        }

        groups
    }
}

/// Errors raised while assembling a product tree.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// Two candidates of one entity share rule, currency and quantity start.
    #[error("{entity} has more than one {currency} price for rule {rule} starting at quantity {quantity_start}")]
    DuplicateTier {
        /// Owning entity
        entity: EntityId,
        /// Currency code
        currency: &'static str,
        /// Rule key (`default` for the rule-less price)
        rule: String,
        /// Duplicated quantity start
        quantity_start: u32,
    },

    /// Quantity starts are 1-based.
    #[error("{0} has a price with a quantity start of zero")]
    ZeroQuantityStart(EntityId),

    /// Gross, net and list price of one candidate use different currencies.
    #[error("{0} has a price mixing currencies {1} and {2}")]
    MixedCurrencies(EntityId, &'static str, &'static str),

    /// A candidate references an entity that is not part of the tree.
    #[error("price references unknown entity {0}")]
    UnknownOwner(EntityId),

    /// Two variants (or a variant and the parent) share an identifier.
    #[error("entity {0} is defined more than once")]
    DuplicateEntity(EntityId),
}

/// A parent product and its variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTree {
    parent: PricedEntity,
    variants: Vec<PricedEntity>,
}

impl ProductTree {
    /// The parent product.
    pub fn parent(&self) -> &PricedEntity {
        &self.parent
    }

    /// The variants.
    pub fn variants(&self) -> &[PricedEntity] {
        &self.variants
    }

    /// Find the parent or a variant by its identifier.
    pub fn entity(&self, id: &EntityId) -> Option<&PricedEntity> {
        std::iter::once(&self.parent)
            .chain(&self.variants)
            .find(|entity| entity.id() == id)
    }

    /// Check if no entity in the tree has any candidate.
    pub fn has_no_candidates(&self) -> bool {
        self.parent.candidates.is_empty()
            && self
                .variants
                .iter()
                .all(|variant| variant.candidates.is_empty())
    }

    /// Check if any entity in the tree has a candidate in `currency`.
    pub fn has_currency(&self, currency: &Currency) -> bool {
        self.parent.has_currency(currency)
            || self
                .variants
                .iter()
                .any(|variant| variant.has_currency(currency))
    }

    /// Return a copy of the tree keeping only the variants matching `keep`.
    #[must_use]
    pub fn retain_variants(&self, keep: impl Fn(&PricedEntity) -> bool) -> Self {
        Self {
            parent: self.parent.clone(),
            variants: self
                .variants
                .iter()
                .filter(|variant| keep(variant))
                .cloned()
                .collect(),
        }
    }

    /// Candidates of `entity` in `currency` grouped by rule, with variants inheriting every
    /// rule group they lack from the parent.
    pub fn effective_candidates<'t>(
        &'t self,
        entity: &'t PricedEntity,
        currency: &Currency,
    ) -> CandidatesByRule<'t> {
        let mut groups = entity.candidates_by_rule(currency);

        if entity.id() == self.parent.id() {
            return groups;
        }

        for (rule, candidates) in self.parent.candidates_by_rule(currency) {
            groups.entry(rule).or_insert(candidates);
        }

        groups
    }
}

/// Builds a [`ProductTree`] from entities and candidate rows.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    parent: EntityId,
    parent_availability: Availability,
    variants: Vec<(EntityId, Availability)>,
    prices: Vec<(EntityId, PriceCandidate)>,
}

impl ProductBuilder {
    /// Start a tree for the given parent.
    pub fn new(parent: impl Into<EntityId>) -> Self {
        Self {
            parent: parent.into(),
            parent_availability: Availability::default(),
            variants: Vec::new(),
            prices: Vec::new(),
        }
    }

    /// Set the parent's availability.
    #[must_use]
    pub fn availability(mut self, availability: Availability) -> Self {
        self.parent_availability = availability;
        self
    }

    /// Add an active variant.
    #[must_use]
    pub fn variant(self, id: impl Into<EntityId>) -> Self {
        self.variant_with(id, Availability::default())
    }

    /// Add a variant with explicit availability.
    #[must_use]
    pub fn variant_with(mut self, id: impl Into<EntityId>, availability: Availability) -> Self {
        self.variants.push((id.into(), availability));
        self
    }

    /// Attach a candidate to the parent or a variant.
    #[must_use]
    pub fn price(mut self, owner: impl Into<EntityId>, candidate: PriceCandidate) -> Self {
        self.prices.push((owner.into(), candidate));
        self
    }

    /// Validate and assemble the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if an entity is duplicated, a candidate references an unknown
    /// owner, mixes currencies, starts at quantity zero, or repeats a tier.
    pub fn build(self) -> Result<ProductTree, ProductError> {
        let mut seen = FxHashSet::default();
        seen.insert(self.parent.clone());

        for (id, _availability) in &self.variants {
            if !seen.insert(id.clone()) {
                return Err(ProductError::DuplicateEntity(id.clone()));
            }
        }

        let mut candidates: FxHashMap<EntityId, Vec<PriceCandidate>> = FxHashMap::default();

        for (owner, candidate) in self.prices {
            if !seen.contains(&owner) {
                return Err(ProductError::UnknownOwner(owner));
            }

            validate_candidate(&owner, &candidate)?;

            let owned = candidates.entry(owner.clone()).or_default();

            if owned.iter().any(|existing| same_tier(existing, &candidate)) {
                return Err(ProductError::DuplicateTier {
                    entity: owner,
                    currency: candidate.currency().iso_alpha_code,
                    rule: candidate
                        .rule()
                        .map_or_else(|| "default".to_string(), ToString::to_string),
                    quantity_start: candidate.quantity_start(),
                });
            }

            owned.push(candidate);
        }

        let parent = PricedEntity {
            candidates: candidates.remove(&self.parent).unwrap_or_default(),
            id: self.parent,
            availability: self.parent_availability,
        };

        let variants = self
            .variants
            .into_iter()
            .map(|(id, availability)| PricedEntity {
                candidates: candidates.remove(&id).unwrap_or_default(),
                id,
                availability,
            })
            .collect();

        Ok(ProductTree { parent, variants })
    }
}

fn validate_candidate(owner: &EntityId, candidate: &PriceCandidate) -> Result<(), ProductError> {
    if candidate.quantity_start() == 0 {
        return Err(ProductError::ZeroQuantityStart(owner.clone()));
    }

    let currency = candidate.currency();
    let others = std::iter::once(candidate.net().currency()).chain(
        candidate
            .list_price()
            .map(rusty_money::Money::currency),
    );

    for other in others {
        if other != currency {
            return Err(ProductError::MixedCurrencies(
                owner.clone(),
                currency.iso_alpha_code,
                other.iso_alpha_code,
            ));
        }
    }

    Ok(())
}

fn same_tier(left: &PriceCandidate, right: &PriceCandidate) -> bool {
    left.rule() == right.rule()
        && left.currency() == right.currency()
        && left.quantity_start() == right.quantity_start()
}
