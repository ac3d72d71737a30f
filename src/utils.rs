//! Utils

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{
    config::{ConfigError, UpdaterConfig},
    context::PriceContext,
    currencies,
    rules::{RuleChain, RuleId},
};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Compact,

    /// One JSON object per event
    Json,
}

/// Arguments for the cheapest price example
#[derive(Debug, Parser)]
pub struct ExampleArgs {
    /// Fixture set to load products from
    #[clap(short, long, default_value = "cheapest")]
    pub fixture: String,

    /// Updater config file (YAML)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Currency to resolve prices in
    #[clap(long, default_value = "EUR")]
    pub currency: String,

    /// Active rules, most preferred first
    #[clap(short, long, value_delimiter = ',')]
    pub rules: Vec<String>,

    /// Order quantity
    #[clap(short, long, default_value_t = 1)]
    pub quantity: u32,

    /// Log output format
    #[clap(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl ExampleArgs {
    /// The requested rule chain.
    pub fn rule_chain(&self) -> RuleChain {
        self.rules.iter().map(|rule| RuleId::new(rule.as_str())).collect()
    }

    /// Build the request context.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the currency is not supported.
    pub fn context(&self) -> Result<PriceContext, ConfigError> {
        let currency = currencies::find(&self.currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))?;

        Ok(PriceContext::new(currency)
            .with_rules(self.rule_chain())
            .with_quantity(self.quantity))
    }

    /// Load the updater config, precomputing the requested rule chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file cannot be read or parsed.
    pub fn updater_config(&self) -> Result<UpdaterConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => UpdaterConfig::from_path(path)?,
            None => UpdaterConfig::default(),
        };

        Ok(config.with_rule_chain(self.rule_chain()))
    }
}
