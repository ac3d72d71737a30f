//! Fixtures

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use crate::products::{ProductError, ProductKey, ProductTree};

pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product key defined by more than one fixture file
    #[error("Product defined more than once: {0}")]
    DuplicateProduct(String),

    /// Product tree validation error
    #[error("Invalid product: {0}")]
    Product(#[from] ProductError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// `SlotMap` storing the product trees with generated keys
    product_trees: SlotMap<ProductKey, ProductTree>,

    /// Display names per product
    product_names: SecondaryMap<ProductKey, String>,

    /// String key -> `SlotMap` key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            product_trees: SlotMap::with_key(),
            product_names: SecondaryMap::new(),
            product_keys: FxHashMap::default(),
        }
    }

    /// Load product trees from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is invalid, a tree fails
    /// validation, or a product key is already loaded.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: products::ProductsFixture = serde_norway::from_str(&contents)?;

        for (key, product_fixture) in fixture.products {
            if self.product_keys.contains_key(&key) {
                return Err(FixtureError::DuplicateProduct(key));
            }

            let name = product_fixture.name.clone();
            let tree = product_fixture.try_into_tree(&key)?;
            let product_key = self.product_trees.insert(tree);

            self.product_names.insert(product_key, name);
            self.product_keys.insert(key, product_key);
        }

        Ok(self)
    }

    /// Load a fixture set by name
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_products(name)?;

        Ok(fixture)
    }

    /// Get a product tree by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&ProductTree, FixtureError> {
        self.product_trees
            .get(self.product_key(key)?)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product's display name by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_name(&self, key: &str) -> Result<&str, FixtureError> {
        self.product_names
            .get(self.product_key(key)?)
            .map(String::as_str)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// All loaded product trees in load order
    pub fn products(&self) -> impl Iterator<Item = &ProductTree> {
        self.product_trees.values()
    }

    /// Get the product trees map
    pub fn product_trees(&self) -> &SlotMap<ProductKey, ProductTree> {
        &self.product_trees
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
