//! Integration tests for listing filters, sorting and aggregations over stored containers.
//!
//! Default EUR unit prices of the `cheapest` fixture set:
//!
//! | product        | price  |
//! |----------------|--------|
//! | asymmetric     | -      |
//! | closeout       | 20.00  |
//! | display        | 110.00 |
//! | inactive       | 14.00  |
//! | list-price     | 50.00  |
//! | multi-currency | 9.00   |
//! | rules          | 100.00 |
//! | tie            | 180.00 |

use rust_decimal::Decimal;
use rusty_money::{Money, iso::EUR};
use testresult::TestResult;

use cheapest_price::{
    fixtures::Fixture,
    listing::{self, ListedProduct, PriceField, RangeFilter, SortDirection},
    prelude::*,
};

fn listed(context: &PriceContext) -> TestResult<Vec<ListedProduct>> {
    let fixture = Fixture::from_set("cheapest")?;
    let updater = CheapestPriceUpdater::new(
        UpdaterConfig::default().with_rule_chain(context.rule_chain.clone()),
    );

    Ok(updater
        .update_batch(fixture.products())?
        .into_iter()
        .map(|(id, container)| ListedProduct::resolve(id, &container, context))
        .collect())
}

fn ids(products: &[ListedProduct]) -> Vec<&str> {
    products.iter().map(|product| product.id.as_str()).collect()
}

#[test]
fn sorts_by_unit_price_with_unpriced_last() -> TestResult {
    let mut products = listed(&PriceContext::new(EUR))?;

    listing::sort(&mut products, PriceField::UnitPrice, SortDirection::Ascending);

    assert_eq!(
        ids(&products),
        vec![
            "multi-currency",
            "inactive",
            "closeout",
            "list-price",
            "rules",
            "display",
            "tie",
            "asymmetric",
        ]
    );

    Ok(())
}

#[test]
fn sorting_follows_the_active_rule_chain() -> TestResult {
    let context = PriceContext::new(EUR).with_rules(RuleChain::from_strs(&["rule-b", "rule-a"]));
    let mut products = listed(&context)?;

    listing::sort(&mut products, PriceField::UnitPrice, SortDirection::Ascending);

    assert_eq!(
        ids(&products),
        vec![
            "multi-currency",
            "inactive",
            "closeout",
            "asymmetric",
            "list-price",
            "rules",
            "display",
            "tie",
        ]
    );

    Ok(())
}

#[test]
fn sorts_by_percentage_descending() -> TestResult {
    let mut products = listed(&PriceContext::new(EUR))?;

    listing::sort(&mut products, PriceField::Percentage, SortDirection::Descending);

    assert_eq!(ids(&products).first(), Some(&"list-price"));
    assert_eq!(ids(&products).last(), Some(&"asymmetric"));

    Ok(())
}

#[test]
fn filters_unit_price_range() -> TestResult {
    let products = listed(&PriceContext::new(EUR))?;
    let range = RangeFilter::new(PriceField::UnitPrice)
        .gte(Decimal::new(10, 0))
        .lte(Decimal::new(100, 0));

    let matched: Vec<&str> = listing::filter(&products, &range)
        .iter()
        .map(|product| product.id.as_str())
        .collect();

    assert_eq!(matched, vec!["closeout", "inactive", "list-price", "rules"]);

    Ok(())
}

#[test]
fn filters_discounted_products() -> TestResult {
    let products = listed(&PriceContext::new(EUR))?;
    let range = RangeFilter::new(PriceField::Percentage).gte(Decimal::new(50, 0));

    let matched = listing::filter(&products, &range);

    assert_eq!(matched.len(), 1);
    assert_eq!(
        matched.first().map(|product| product.id.as_str()),
        Some("list-price")
    );

    Ok(())
}

#[test]
fn aggregates_priced_products() -> TestResult {
    let products = listed(&PriceContext::new(EUR))?;
    let aggregation = listing::aggregate(&products)?.ok_or("expected an aggregation")?;

    assert_eq!(aggregation.count, 7);
    assert_eq!(aggregation.min, Money::from_minor(900, EUR));
    assert_eq!(aggregation.max, Money::from_minor(18_000, EUR));
    assert_eq!(aggregation.sum, Money::from_minor(48_300, EUR));
    assert_eq!(aggregation.avg, Money::from_minor(6_900, EUR));

    Ok(())
}
