//! Integration tests for persisted containers and the search document projection.
//!
//! Every product of the `cheapest` fixture set is computed for EUR and USD under several rule
//! chains. The stored container must survive a JSON round trip, agree with a fresh calculation
//! at any quantity, and agree with the search document to two decimal places.

use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{EUR, USD},
};
use testresult::TestResult;

use cheapest_price::{fixtures::Fixture, index::SearchDocument, prelude::*};

fn chains() -> Vec<RuleChain> {
    vec![
        RuleChain::from_strs(&["rule-a"]),
        RuleChain::from_strs(&["rule-b", "rule-a"]),
        RuleChain::from_strs(&["rule-a", "rule-b"]),
    ]
}

fn updater() -> CheapestPriceUpdater {
    let config = UpdaterConfig {
        currencies: vec![EUR, USD],
        ..UpdaterConfig::default()
    };

    CheapestPriceUpdater::new(chains().into_iter().fold(config, UpdaterConfig::with_rule_chain))
}

#[test]
fn containers_survive_a_json_round_trip() -> TestResult {
    let fixture = Fixture::from_set("cheapest")?;
    let containers = updater().update_batch(fixture.products())?;

    assert_eq!(containers.len(), fixture.product_trees().len());

    for container in containers.values() {
        let decoded = CheapestPriceContainer::from_json(&container.to_json()?)?;

        assert_eq!(&decoded, container);
    }

    Ok(())
}

#[test]
fn stored_prices_match_fresh_calculations() -> TestResult {
    let fixture = Fixture::from_set("cheapest")?;
    let updater = updater();

    for tree in fixture.products() {
        let container = CheapestPriceContainer::from_json(&updater.update(tree)?.to_json()?)?;

        for chain in &updater.config().rule_chains {
            for quantity in [1, 2, 3, 10] {
                let context = PriceContext::new(EUR)
                    .with_rules(chain.clone())
                    .with_quantity(quantity);

                let fresh = CheapestPriceCalculator::compute_cheapest(tree, EUR, chain, quantity)?;
                let stored = container.resolve(&context);

                match fresh {
                    Some(fresh) => {
                        let stored = stored.ok_or("expected a stored price")?;

                        assert_eq!(stored.unit_price, fresh.unit_price);
                        assert_eq!(stored.unit_net, fresh.unit_net);
                        assert_eq!(stored.percentage, fresh.percentage);
                        assert_eq!(stored.variant_id, fresh.variant_id);
                        assert_eq!(stored.has_range, fresh.has_range);
                    }
                    // Chains without a price fall back to the default chain.
                    None => assert_eq!(
                        stored,
                        container.resolve(&PriceContext::new(EUR).with_quantity(quantity))
                    ),
                }
            }
        }
    }

    Ok(())
}

#[test]
fn search_document_agrees_with_container() -> TestResult {
    let fixture = Fixture::from_set("cheapest")?;
    let updater = updater();

    let contexts: Vec<PriceContext> = [EUR, USD]
        .into_iter()
        .flat_map(|currency| {
            chains()
                .into_iter()
                .chain([RuleChain::empty(), RuleChain::from_strs(&["rule-x"])])
                .flat_map(move |chain| {
                    [1, 2, 3, 10].map(|quantity| {
                        PriceContext::new(currency)
                            .with_rules(chain.clone())
                            .with_quantity(quantity)
                    })
                })
        })
        .collect();

    for tree in fixture.products() {
        let container = updater.update(tree)?;
        let document = SearchDocument::from_container(tree.parent().id().clone(), &container);

        for context in &contexts {
            let resolved = container.resolve(context);
            let indexed = document.lookup(context);

            match (resolved, indexed) {
                (Some(resolved), Some(indexed)) => {
                    assert_eq!(indexed.gross, resolved.unit_price.amount().round_dp(2));
                    assert_eq!(
                        indexed.percentage,
                        resolved.percentage.unwrap_or(Decimal::ZERO)
                    );
                }
                (None, None) => {}
                (resolved, indexed) => {
                    return Err(format!(
                        "{} disagrees for {} at quantity {}: container {resolved:?}, index {indexed:?}",
                        tree.parent().id(),
                        context.rule_chain,
                        context.quantity
                    )
                    .into());
                }
            }
        }
    }

    Ok(())
}

#[test]
fn search_document_applies_tiers_like_the_container() -> TestResult {
    let fixture = Fixture::from_set("cheapest")?;
    let tree = fixture.product("display")?;
    let container = updater().update(tree)?;
    let document = SearchDocument::from_container(tree.parent().id().clone(), &container);

    let context = PriceContext::new(EUR)
        .with_rules(RuleChain::from_strs(&["rule-a"]))
        .with_quantity(3);

    let resolved = container.resolve(&context).ok_or("expected a price")?;
    let indexed = document.lookup(&context).ok_or("expected an indexed price")?;

    assert_eq!(resolved.unit_price, Money::from_minor(10_000, EUR));
    assert_eq!(indexed.gross, Decimal::new(10_000, 2));

    Ok(())
}

#[test]
fn legacy_payload_resolves_like_a_single_tier() -> TestResult {
    let legacy = r#"{
        "prices": [
            {"currency": "EUR", "rules": [], "variant_id": "tie", "unit_price": 18000},
            {"currency": "eur", "rules": ["rule-a"], "variant_id": "tie.a", "unit_price": 15000, "list_price": 30000}
        ]
    }"#;

    let container = CheapestPriceContainer::from_json(legacy)?;

    assert_eq!(container.len(), 2);

    let default = container
        .resolve(&PriceContext::new(EUR).with_quantity(7))
        .ok_or("expected a default price")?;

    assert_eq!(default.unit_price, Money::from_minor(18_000, EUR));
    assert!(default.quantity_prices.is_empty());
    assert_eq!(default.percentage, None);

    let rule_a = container
        .resolve(&PriceContext::new(EUR).with_rules(RuleChain::from_strs(&["rule-a"])))
        .ok_or("expected a rule price")?;

    assert_eq!(rule_a.variant_id, EntityId::from("tie.a"));
    assert_eq!(rule_a.percentage, Some(Decimal::new(50, 0)));

    let reencoded = CheapestPriceContainer::from_json(&container.to_json()?)?;

    assert_eq!(reencoded, container);

    Ok(())
}

#[test]
fn unsupported_payload_version_is_rejected() {
    let result = CheapestPriceContainer::from_json(r#"{"version":99,"entries":[]}"#);

    assert!(matches!(result, Err(ContainerError::UnsupportedVersion(99))));
}
