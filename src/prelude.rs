//! Cheapest price prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cheapest::{
        CheapestPriceCalculator, CheapestPriceContainer, PriceError, ProductPrices, ResolvedPrice,
        payload::ContainerError,
    },
    config::{ConfigError, UpdaterConfig},
    context::PriceContext,
    discounts::{DiscountError, list_price_percentage},
    index::{IndexedPrice, SearchDocument},
    listing::{ListedProduct, ListingError, PriceAggregation, RangeFilter, SortDirection},
    prices::{PriceCandidate, QuantityPrice},
    products::{
        Availability, EntityId, PricedEntity, ProductBuilder, ProductError, ProductKey,
        ProductTree, SalesChannelId,
    },
    rules::{AppliedRule, RuleChain, RuleId},
    updater::CheapestPriceUpdater,
};
