//! Updater Config
//!
//! YAML configuration for the write-side [`CheapestPriceUpdater`](crate::updater::CheapestPriceUpdater).
//!
//! ```yaml
//! currencies: [EUR, USD]
//! rule_chains:
//!   - [rule-b, rule-a]
//!   - [rule-a]
//! hide_closeout_when_out_of_stock: true
//! sales_channels: [storefront]
//! ```

use std::{fs, path::Path};

use rusty_money::iso::{Currency, EUR};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    currencies,
    products::SalesChannelId,
    rules::{RuleChain, RuleId},
};

/// Config Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// No currency configured
    #[error("At least one currency must be configured")]
    NoCurrencies,
}

/// Raw config as written in YAML.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdaterConfigFile {
    /// ISO currency codes to compute.
    pub currencies: Vec<String>,

    /// Rule chains to precompute besides the default chain.
    pub rule_chains: Vec<Vec<String>>,

    /// Drop closeout variants without stock.
    pub hide_closeout_when_out_of_stock: bool,

    /// Sales channels a variant must be visible in.
    pub sales_channels: Option<Vec<String>>,
}

impl Default for UpdaterConfigFile {
    fn default() -> Self {
        Self {
            currencies: vec![EUR.iso_alpha_code.to_string()],
            rule_chains: Vec::new(),
            hide_closeout_when_out_of_stock: false,
            sales_channels: None,
        }
    }
}

/// Validated updater config.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterConfig {
    /// Currencies to compute.
    pub currencies: Vec<&'static Currency>,

    /// Rule chains to compute, always starting with the default chain.
    pub rule_chains: Vec<RuleChain>,

    /// Drop closeout variants without stock.
    pub hide_closeout_when_out_of_stock: bool,

    /// Sales channels a variant must be visible in. `None` admits every variant.
    pub sales_channels: Option<Vec<SalesChannelId>>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            currencies: vec![EUR],
            rule_chains: vec![RuleChain::empty()],
            hide_closeout_when_out_of_stock: false,
            sales_channels: None,
        }
    }
}

impl UpdaterConfig {
    /// Parse a YAML config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is invalid or references unknown currencies.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: UpdaterConfigFile = serde_norway::from_str(contents)?;

        file.try_into()
    }

    /// Read and parse a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Add a rule chain to precompute, ignoring chains already configured.
    #[must_use]
    pub fn with_rule_chain(mut self, rule_chain: RuleChain) -> Self {
        if !self.rule_chains.contains(&rule_chain) {
            self.rule_chains.push(rule_chain);
        }

        self
    }
}

impl TryFrom<UpdaterConfigFile> for UpdaterConfig {
    type Error = ConfigError;

    fn try_from(file: UpdaterConfigFile) -> Result<Self, Self::Error> {
        if file.currencies.is_empty() {
            return Err(ConfigError::NoCurrencies);
        }

        let mut parsed: Vec<&'static Currency> = Vec::with_capacity(file.currencies.len());

        for code in &file.currencies {
            let currency =
                currencies::find(code).ok_or_else(|| ConfigError::UnknownCurrency(code.clone()))?;

            if !parsed.contains(&currency) {
                parsed.push(currency);
            }
        }

        let config = Self {
            currencies: parsed,
            hide_closeout_when_out_of_stock: file.hide_closeout_when_out_of_stock,
            sales_channels: file
                .sales_channels
                .map(|channels| channels.into_iter().map(SalesChannelId::new).collect()),
            ..Self::default()
        };

        Ok(file
            .rule_chains
            .into_iter()
            .map(|rules| rules.into_iter().map(RuleId::new).collect::<RuleChain>())
            .fold(config, Self::with_rule_chain))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() -> TestResult {
        let config = UpdaterConfig::from_yaml_str("{}")?;

        assert_eq!(config, UpdaterConfig::default());

        Ok(())
    }

    #[test]
    fn parses_full_config() -> TestResult {
        let config = UpdaterConfig::from_yaml_str(
            "currencies: [EUR, usd, EUR]\n\
             rule_chains:\n  - [rule-b, rule-a]\n  - []\n  - [rule-a]\n\
             hide_closeout_when_out_of_stock: true\n\
             sales_channels: [storefront]\n",
        )?;

        assert_eq!(config.currencies, vec![EUR, USD]);
        assert_eq!(
            config.rule_chains,
            vec![
                RuleChain::empty(),
                RuleChain::from_strs(&["rule-b", "rule-a"]),
                RuleChain::from_strs(&["rule-a"]),
            ]
        );
        assert!(config.hide_closeout_when_out_of_stock);
        assert_eq!(config.sales_channels, Some(vec![SalesChannelId::from("storefront")]));

        Ok(())
    }

    #[test]
    fn rejects_unknown_currency() {
        let result = UpdaterConfig::from_yaml_str("currencies: [ABC]");

        assert!(matches!(result, Err(ConfigError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn rejects_empty_currencies() {
        let result = UpdaterConfig::from_yaml_str("currencies: []");

        assert!(matches!(result, Err(ConfigError::NoCurrencies)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = UpdaterConfig::from_yaml_str("currency: EUR");

        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn reads_config_from_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "currencies: [GBP]")?;

        let config = UpdaterConfig::from_path(file.path())?;

        assert_eq!(config.currencies, vec![rusty_money::iso::GBP]);

        Ok(())
    }
}
