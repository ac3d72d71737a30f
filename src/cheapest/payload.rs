//! Persisted Container Payload
//!
//! Containers are stored as versioned JSON. Version 1 payloads were written before tiers, the
//! resolved rule, net prices and range flags were stored; they carry no `version` field and are
//! upgraded on decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Version written by [`encode`].
pub const CURRENT_VERSION: u64 = 2;

/// Errors decoding or encoding a container payload.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The payload is not valid JSON or does not match its version's shape.
    #[error("malformed container payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The `version` field is not a non-negative integer.
    #[error("container payload version is not an integer")]
    InvalidVersion,

    /// The payload was written by a newer version.
    #[error("unsupported container payload version {0}")]
    UnsupportedVersion(u64),
}

/// A stored tier, amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTier {
    /// Smallest order quantity the tier applies to.
    pub quantity_start: u32,

    /// Gross unit price.
    pub gross: i64,

    /// Net unit price, the gross price when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<i64>,

    /// Gross list price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<i64>,
}

/// A stored price, amounts in minor units. Every field is optional on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrice {
    /// The parent or variant that produced the price.
    #[serde(default)]
    pub variant_id: Option<String>,

    /// Rule the winning entity resolved to.
    #[serde(default)]
    pub rule: Option<String>,

    /// Gross unit price of the first tier.
    #[serde(default)]
    pub unit_price: Option<i64>,

    /// Net unit price of the first tier.
    #[serde(default)]
    pub unit_net: Option<i64>,

    /// Gross list price of the first tier.
    #[serde(default)]
    pub list_price: Option<i64>,

    /// Tiers, ascending by quantity start.
    #[serde(default)]
    pub quantity_prices: Vec<StoredTier>,

    /// Whether a "from" price should be shown.
    #[serde(default)]
    pub has_range: bool,
}

/// One currency / rule chain entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    /// ISO currency code.
    pub currency: String,

    /// Rule chain, most preferred first. Empty for the default chain.
    #[serde(default)]
    pub rules: Vec<String>,

    /// The stored price.
    #[serde(default)]
    pub price: StoredPrice,
}

/// Current payload layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Always [`CURRENT_VERSION`] once encoded.
    pub version: u64,

    /// Stored entries.
    #[serde(default)]
    pub entries: Vec<PayloadEntry>,
}

/// Legacy entry, written before tiers were stored.
#[derive(Debug, Clone, Deserialize)]
struct LegacyEntry {
    currency: String,
    #[serde(default)]
    rules: Vec<String>,
    #[serde(default)]
    variant_id: Option<String>,
    #[serde(default)]
    unit_price: Option<i64>,
    #[serde(default)]
    list_price: Option<i64>,
}

/// Legacy payload layout.
#[derive(Debug, Clone, Deserialize)]
struct LegacyPayload {
    #[serde(default)]
    prices: Vec<LegacyEntry>,
}

/// Decode a payload of any supported version into the current layout.
///
/// # Errors
///
/// Returns a [`ContainerError`] if the JSON is malformed or the version is unsupported.
pub fn decode(json: &str) -> Result<Payload, ContainerError> {
    let value: Value = serde_json::from_str(json)?;

    let version = match value.get("version") {
        None => 1,
        Some(version) => version.as_u64().ok_or(ContainerError::InvalidVersion)?,
    };

    match version {
        1 => Ok(upgrade_v1(serde_json::from_value(value)?)),
        CURRENT_VERSION => Ok(serde_json::from_value(value)?),
        other => Err(ContainerError::UnsupportedVersion(other)),
    }
}

/// Encode a payload with the current version.
///
/// # Errors
///
/// Returns a [`ContainerError`] if serialization fails.
pub fn encode(entries: Vec<PayloadEntry>) -> Result<String, ContainerError> {
    Ok(serde_json::to_string(&Payload {
        version: CURRENT_VERSION,
        entries,
    })?)
}

fn upgrade_v1(legacy: LegacyPayload) -> Payload {
    let entries = legacy
        .prices
        .into_iter()
        .map(|entry| PayloadEntry {
            currency: entry.currency,
            rules: entry.rules,
            price: StoredPrice {
                variant_id: entry.variant_id,
                rule: None,
                unit_price: entry.unit_price,
                unit_net: None,
                list_price: entry.list_price,
                quantity_prices: Vec::new(),
                has_range: false,
            },
        })
        .collect();

    Payload {
        version: CURRENT_VERSION,
        entries,
    }
}
