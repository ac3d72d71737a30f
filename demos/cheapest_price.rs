//! Cheapest Price Example
//!
//! Computes cheapest price containers for a fixture set and resolves them for a request.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to load an updater config file
//! Use `-r` to activate rules, most preferred first (e.g. `-r rule-b,rule-a`)
//! Use `-q` to set the order quantity
//! Set `RUST_LOG=debug` to see the winner of every calculation

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cheapest_price::{
    fixtures::Fixture,
    index::SearchDocument,
    listing::{self, ListedProduct, PriceField, SortDirection},
    prelude::*,
    utils::{ExampleArgs, LogFormat},
};

fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

fn format_percentage(price: &ResolvedPrice) -> String {
    price
        .percentage
        .map_or_else(|| "-".to_string(), |percentage| format!("{percentage}%"))
}

/// Cheapest Price Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = ExampleArgs::parse();

    init_logging(args.log_format)?;

    let context = args.context()?;
    let updater = CheapestPriceUpdater::new(args.updater_config()?);
    let fixture = Fixture::from_set(&args.fixture)?;

    info!(
        fixture = %args.fixture,
        products = fixture.product_trees().len(),
        currency = context.currency.iso_alpha_code,
        rule_chain = %context.rule_chain,
        quantity = context.quantity,
        "computing cheapest prices"
    );

    let containers = updater.update_batch(fixture.products())?;
    let mut listed = Vec::with_capacity(containers.len());

    for (id, container) in &containers {
        // Persist and reload to resolve the way a storefront would.
        let container = CheapestPriceContainer::from_json(&container.to_json()?)?;
        let product = ListedProduct::resolve(id.clone(), &container, &context);
        let document = SearchDocument::from_container(id.clone(), &container);

        let name = fixture.product_name(id.as_str())?;
        let display = CheapestPriceCalculator::evaluate(fixture.product(id.as_str())?, &context)
            .ok()
            .and_then(|prices| prices.price);

        match &product.price {
            Some(price) => println!(
                "{name:<20} {from}{unit:>10}  list {list:>10}  discount {pct:>7}  winner {winner:<20} price {display}  indexed {indexed}",
                from = if price.has_range { "from " } else { "     " },
                unit = price.unit_price.to_string(),
                list = price
                    .list_price
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
                pct = format_percentage(price),
                winner = price.variant_id,
                display = display.map_or_else(|| "-".to_string(), |price| price.unit_price.to_string()),
                indexed = document
                    .lookup(&context)
                    .map_or_else(|| "-".to_string(), |indexed| indexed.gross.to_string()),
            ),
            None => println!("{name:<20} no price"),
        }

        listed.push(product);
    }

    listing::sort(&mut listed, PriceField::UnitPrice, SortDirection::Ascending);

    let order: Vec<&str> = listed.iter().map(|product| product.id.as_str()).collect();

    println!("\nSorted by unit price: {}", order.join(", "));

    if let Some(aggregation) = listing::aggregate(&listed)? {
        println!(
            "min {} / max {} / avg {} / sum {} over {} products",
            aggregation.min, aggregation.max, aggregation.avg, aggregation.sum, aggregation.count
        );
    }

    Ok(())
}
