//! Search Document
//!
//! A flat projection of a [`CheapestPriceContainer`] for a secondary search index. Every
//! currency / rule chain entry becomes a gross and a percentage field for its base price, plus
//! one pair per quantity tier. Lookups apply the same chain fallback and tier selection as
//! [`CheapestPriceContainer::resolve`] so both paths agree to two decimal places.
//!
//! Field names are `cheapest_price_{chain}_{currency}_{gross|percentage}` for base prices and
//! `cheapest_price_{chain}_{currency}_from_{quantity}_{gross|percentage}` for tiers. `chain` is
//! `default` for the empty chain, otherwise `rules_` followed by the rule ids joined with `+`,
//! with `%` and `+` inside ids percent-encoded.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    cheapest::{CheapestPriceContainer, ResolvedPrice},
    context::PriceContext,
    currencies,
    products::EntityId,
    rules::{RuleChain, RuleId},
};

/// Kind of an indexed price field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    /// Gross unit price in major units.
    Gross,

    /// List-price discount in percent.
    Percentage,
}

impl PriceField {
    fn suffix(self) -> &'static str {
        match self {
            Self::Gross => "gross",
            Self::Percentage => "percentage",
        }
    }
}

/// Values read back from a search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedPrice {
    /// Gross unit price in major units.
    pub gross: Decimal,

    /// List-price discount in percent, zero without a list price.
    pub percentage: Decimal,
}

/// Indexed cheapest prices of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    product_id: EntityId,
    fields: BTreeMap<String, Decimal>,
}

impl SearchDocument {
    /// Name of the field holding the base price `field` for a rule chain and currency code.
    pub fn field_name(rule_chain: &RuleChain, currency: &str, field: PriceField) -> String {
        format!("{}_{}", Self::field_prefix(rule_chain, currency), field.suffix())
    }

    /// Name of the field holding `field` for the tier starting at `quantity_start`.
    pub fn tier_field_name(
        rule_chain: &RuleChain,
        currency: &str,
        quantity_start: u32,
        field: PriceField,
    ) -> String {
        format!(
            "{}_from_{quantity_start}_{}",
            Self::field_prefix(rule_chain, currency),
            field.suffix()
        )
    }

    fn field_prefix(rule_chain: &RuleChain, currency: &str) -> String {
        let chain = if rule_chain.is_empty() {
            "default".to_string()
        } else {
            let rules: Vec<String> = rule_chain.iter().map(escape_rule).collect();

            format!("rules_{}", rules.join("+"))
        };

        format!("cheapest_price_{chain}_{}", currency.to_ascii_lowercase())
    }

    /// Project every resolvable container entry into document fields.
    ///
    /// Entries without a unit price or with an unsupported currency are left out.
    pub fn from_container(product_id: EntityId, container: &CheapestPriceContainer) -> Self {
        let mut document = Self {
            product_id,
            fields: BTreeMap::new(),
        };

        for (code, chain, stored) in container.iter() {
            let Some(price) =
                currencies::find(code).and_then(|currency| stored.to_resolved(currency))
            else {
                continue;
            };

            let Some(base) = document.resolve_at(&price, 1, chain) else {
                continue;
            };

            for field in [PriceField::Gross, PriceField::Percentage] {
                document.insert(Self::field_name(chain, code, field), &base, field);
            }

            for start in price.quantity_prices.iter().map(|tier| tier.quantity_start) {
                let Some(tiered) = document.resolve_at(&price, start, chain) else {
                    continue;
                };

                for field in [PriceField::Gross, PriceField::Percentage] {
                    let name = Self::tier_field_name(chain, code, start, field);

                    document.insert(name, &tiered, field);
                }
            }
        }

        document
    }

    fn resolve_at(
        &self,
        price: &ResolvedPrice,
        quantity: u32,
        chain: &RuleChain,
    ) -> Option<ResolvedPrice> {
        price
            .at_quantity(quantity)
            .inspect_err(|error| {
                warn!(
                    product = %self.product_id,
                    rule_chain = %chain,
                    quantity,
                    %error,
                    "skipping unindexable price"
                );
            })
            .ok()
    }

    fn insert(&mut self, name: String, price: &ResolvedPrice, field: PriceField) {
        let value = match field {
            PriceField::Gross => price.unit_price.amount().round_dp(2),
            PriceField::Percentage => price.percentage.unwrap_or(Decimal::ZERO),
        };

        self.fields.insert(name, value);
    }

    /// Product the document belongs to.
    pub fn product_id(&self) -> &EntityId {
        &self.product_id
    }

    /// All indexed fields.
    pub fn fields(&self) -> &BTreeMap<String, Decimal> {
        &self.fields
    }

    /// Read the price for a context, falling back to the default chain.
    ///
    /// The tier with the greatest start not above the context quantity applies, the first tier
    /// below every start. Entries indexed without tiers return their base price.
    pub fn lookup(&self, context: &PriceContext) -> Option<IndexedPrice> {
        let code = context.currency.iso_alpha_code;

        [context.rule_chain.clone(), RuleChain::empty()]
            .iter()
            .find_map(|chain| self.lookup_chain(chain, code, context.quantity))
    }

    fn lookup_chain(&self, chain: &RuleChain, code: &str, quantity: u32) -> Option<IndexedPrice> {
        let base = self.read(
            &Self::field_name(chain, code, PriceField::Gross),
            &Self::field_name(chain, code, PriceField::Percentage),
        )?;

        let tier_prefix = format!("{}_from_", Self::field_prefix(chain, code));
        let starts: Vec<u32> = self
            .fields
            .range(tier_prefix.clone()..)
            .map(|(name, _)| name)
            .take_while(|name| name.starts_with(&tier_prefix))
            .filter_map(|name| {
                name.get(tier_prefix.len()..)?
                    .strip_suffix("_gross")?
                    .parse()
                    .ok()
            })
            .collect();

        let start = starts
            .iter()
            .copied()
            .filter(|start| *start <= quantity)
            .max()
            .or_else(|| starts.iter().copied().min());

        let Some(start) = start else {
            return Some(base);
        };

        self.read(
            &Self::tier_field_name(chain, code, start, PriceField::Gross),
            &Self::tier_field_name(chain, code, start, PriceField::Percentage),
        )
    }

    fn read(&self, gross: &str, percentage: &str) -> Option<IndexedPrice> {
        Some(IndexedPrice {
            gross: *self.fields.get(gross)?,
            percentage: self.fields.get(percentage).copied().unwrap_or(Decimal::ZERO),
        })
    }
}

fn escape_rule(rule: &RuleId) -> String {
    rule.as_str().replace('%', "%25").replace('+', "%2B")
}
