//! Cheapest Price
//!
//! Cheapest price resolution for products with variants, advanced pricing rules and quantity
//! tiers. Prices are computed on write per currency and rule chain, stored in a versioned
//! container and resolved per request.

pub mod cheapest;
pub mod config;
pub mod context;
pub mod currencies;
pub mod discounts;
pub mod fixtures;
pub mod index;
pub mod listing;
pub mod prelude;
pub mod prices;
pub mod products;
pub mod rules;
pub mod updater;
pub mod utils;
