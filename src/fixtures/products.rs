//! Product Fixtures

use std::{collections::BTreeMap, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    currencies,
    fixtures::FixtureError,
    prices::PriceCandidate,
    products::{Availability, EntityId, ProductBuilder, ProductTree, SalesChannelId},
    rules::RuleId,
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key -> product fixture
    pub products: BTreeMap<String, ProductFixture>,
}

/// Parent product fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Whether the parent is active
    #[serde(default = "default_active")]
    pub active: bool,

    /// Parent prices
    #[serde(default)]
    pub prices: Vec<PriceFixture>,

    /// Map of variant id -> variant fixture
    #[serde(default)]
    pub variants: BTreeMap<String, VariantFixture>,
}

/// Variant fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantFixture {
    /// Whether the variant is active
    #[serde(default = "default_active")]
    pub active: bool,

    /// Whether the variant is a closeout
    #[serde(default)]
    pub closeout: bool,

    /// Available stock
    #[serde(default)]
    pub stock: i64,

    /// Sales channels the variant is visible in
    #[serde(default)]
    pub sales_channels: Vec<String>,

    /// Variant prices, inherited from the parent per rule when absent
    #[serde(default)]
    pub prices: Vec<PriceFixture>,
}

impl VariantFixture {
    fn availability(&self) -> Availability {
        Availability {
            active: self.active,
            closeout: self.closeout,
            stock: self.stock,
            sales_channels: self
                .sales_channels
                .iter()
                .map(|channel| SalesChannelId::new(channel.as_str()))
                .collect::<SmallVec<_>>(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Price row from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceFixture {
    /// Gross price string (e.g., "180.00 EUR")
    pub price: String,

    /// Net price string, defaults to the gross price
    #[serde(default)]
    pub net: Option<String>,

    /// Gross list price string
    #[serde(default)]
    pub list_price: Option<String>,

    /// Rule the price belongs to, the default price when absent
    #[serde(default)]
    pub rule: Option<String>,

    /// Smallest order quantity the price applies to
    #[serde(default = "default_quantity_start")]
    pub quantity_start: u32,
}

fn default_quantity_start() -> u32 {
    1
}

impl TryFrom<&PriceFixture> for PriceCandidate {
    type Error = FixtureError;

    fn try_from(fixture: &PriceFixture) -> Result<Self, Self::Error> {
        let gross = parse_money(&fixture.price)?;
        let net = fixture.net.as_deref().map_or(Ok(gross), parse_money)?;

        let candidate = PriceCandidate::new(
            fixture.rule.clone().map(RuleId::new),
            fixture.quantity_start,
            gross,
            net,
        );

        match fixture.list_price.as_deref() {
            Some(list_price) => Ok(candidate.with_list_price(parse_money(list_price)?)),
            None => Ok(candidate),
        }
    }
}

impl ProductFixture {
    /// Convert into a validated product tree with `key` as the parent identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is invalid or the tree fails validation.
    pub fn try_into_tree(self, key: &str) -> Result<ProductTree, FixtureError> {
        let parent = EntityId::from(key);
        let mut builder = ProductBuilder::new(parent.clone()).availability(Availability {
            active: self.active,
            ..Availability::default()
        });

        for price in &self.prices {
            builder = builder.price(parent.clone(), price.try_into()?);
        }

        for (id, variant) in self.variants {
            let id = EntityId::new(id);

            builder = builder.variant_with(id.clone(), variant.availability());

            for price in &variant.prices {
                builder = builder.price(id.clone(), price.try_into()?);
            }
        }

        Ok(builder.build()?)
    }
}

/// Parse a price string (e.g., "2.50 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not an amount followed by a supported currency code, or
/// the amount has more decimal places than the currency allows.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    };

    let currency =
        currencies::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    let minor_units = Decimal::from_str(amount)
        .ok()
        .zip(10_i64.checked_pow(currency.exponent))
        .and_then(|(amount, scale)| amount.checked_mul(Decimal::from(scale)))
        .filter(|minor| minor.fract().is_zero())
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, JPY};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_minor_units() -> TestResult {
        assert_eq!(parse_price("180.00 EUR")?, (18_000, EUR));
        assert_eq!(parse_price("0.5 eur")?, (50, EUR));
        assert_eq!(parse_price("1200 JPY")?, (1_200, JPY));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_strings() {
        assert!(matches!(parse_price("180.00"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("abc EUR"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("1.005 EUR"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("1.00 EUR extra"), Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("1.00 ABC"),
            Err(FixtureError::UnknownCurrency(code)) if code == "ABC"
        ));
    }

    #[test]
    fn price_fixture_defaults_net_and_quantity() -> TestResult {
        let fixture: PriceFixture = serde_norway::from_str("price: 12.00 EUR\nrule: rule-a\n")?;
        let candidate = PriceCandidate::try_from(&fixture)?;

        assert_eq!(candidate.net(), &Money::from_minor(1_200, EUR));
        assert_eq!(candidate.quantity_start(), 1);
        assert_eq!(candidate.rule(), Some(&RuleId::from("rule-a")));
        assert_eq!(candidate.list_price(), None);

        Ok(())
    }

    #[test]
    fn product_fixture_builds_tree() -> TestResult {
        let yaml = r"
name: Shirt
prices:
  - price: 20.00 EUR
    list_price: 30.00 EUR
variants:
  shirt.red:
    closeout: true
    stock: 0
    prices:
      - price: 18.00 EUR
        net: 15.13 EUR
  shirt.blue:
    active: false
";
        let fixture: ProductFixture = serde_norway::from_str(yaml)?;
        let tree = fixture.try_into_tree("shirt")?;

        assert_eq!(tree.parent().id(), &EntityId::from("shirt"));
        assert_eq!(tree.variants().len(), 2);

        let red = tree
            .entity(&EntityId::from("shirt.red"))
            .ok_or("missing variant")?;

        assert!(red.availability().is_sold_out_closeout());
        assert_eq!(red.candidates().len(), 1);

        let blue = tree
            .entity(&EntityId::from("shirt.blue"))
            .ok_or("missing variant")?;

        assert!(!blue.availability().active);

        Ok(())
    }

    #[test]
    fn product_fixture_surfaces_tree_errors() -> TestResult {
        let yaml = r"
name: Broken
prices:
  - price: 20.00 EUR
  - price: 19.00 EUR
";
        let fixture: ProductFixture = serde_norway::from_str(yaml)?;

        assert!(matches!(fixture.try_into_tree("broken"), Err(FixtureError::Product(_))));

        Ok(())
    }
}
