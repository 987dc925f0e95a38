//! Fixtures
//!
//! YAML-defined catalogs, carts and allocation configs for demos and tests.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, NewLine},
    config::{AllocationConfig, ConfigError},
    fixtures::{carts::CartFixture, catalog::CatalogFixture},
    products::{Catalog, Product, ProductKey, ProductKind},
};

pub mod carts;
pub mod catalog;

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

    /// A variation names a parent that is not in the catalog (variation, parent).
    #[error("Product {0} has unknown parent {1}")]
    ParentNotFound(String, String),

    /// Currency mismatch between prices
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// No allocation config loaded
    #[error("No allocation config loaded")]
    NoConfig,

    /// Allocation config error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products keyed by `ProductKey`
    catalog: Catalog<'a>,

    /// String key -> `ProductKey` mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,

    /// Cart lines in cart order
    lines: Vec<NewLine<'a>>,

    /// Allocation config, if loaded
    config: Option<AllocationConfig>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: Catalog::new(),
            product_keys: FxHashMap::default(),
            lines: Vec::new(),
            config: None,
            currency: None,
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is invalid,
    /// prices use different currencies, or a variation's parent is unknown.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CatalogFixture = serde_norway::from_str(&contents)?;

        let mut parents = Vec::new();

        for (key, product_fixture) in fixture.products {
            let price = catalog::parse_price(&product_fixture.price)?;
            self.check_currency(price.currency())?;

            let product = Product::simple(
                product_fixture.name.clone(),
                product_fixture.category_set(),
                price,
            );
            let product_key = self.catalog.insert(product);

            if let Some(parent) = product_fixture.parent {
                parents.push((key.clone(), product_key, parent));
            }

            self.product_keys.insert(key, product_key);
        }

        // Parents may appear after their variations, so link once every key exists.
        for (key, product_key, parent) in parents {
            let parent_key = *self
                .product_keys
                .get(&parent)
                .ok_or_else(|| FixtureError::ParentNotFound(key.clone(), parent.clone()))?;

            let product = self
                .catalog
                .get_mut(product_key)
                .ok_or_else(|| FixtureError::ProductNotFound(key.clone()))?;

            product.kind = ProductKind::Variation { parent: parent_key };
        }

        Ok(self)
    }

    /// Load cart lines from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a line refers to
    /// an unknown product or carries an invalid price.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        for line in fixture.lines {
            let product_key = self.product_key(&line.product)?;
            let product = self
                .catalog
                .get(product_key)
                .ok_or_else(|| FixtureError::ProductNotFound(line.product.clone()))?;

            let price: Money<'a, Currency> = match line.price.as_deref() {
                Some(price) => catalog::parse_price(price)?,
                None => product.price,
            };

            self.check_currency(price.currency())?;
            self.lines.push(NewLine::new(product_key, price, line.quantity));
        }

        Ok(self)
    }

    /// Load an allocation config from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the config is invalid.
    pub fn load_config(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("configs").join(format!("{name}.yml"));

        self.config = Some(AllocationConfig::from_path(file_path)?);

        Ok(self)
    }

    /// Load a complete fixture set (catalog, cart, and config with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_catalog(name)?
            .load_cart(name)?
            .load_config(name)?;

        Ok(fixture)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        let product_key = self.product_key(key)?;

        self.catalog
            .get(product_key)
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

    /// The loaded catalog
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// The loaded cart lines
    pub fn lines(&self) -> &[NewLine<'a>] {
        &self.lines
    }

    /// The loaded allocation config
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoConfig`] if no config has been loaded.
    pub fn config(&self) -> Result<&AllocationConfig, FixtureError> {
        self.config.as_ref().ok_or(FixtureError::NoConfig)
    }

    /// Create a cart snapshot from the loaded lines
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded or cart creation fails.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        let currency = self.currency()?;

        Ok(Cart::with_lines(self.lines.iter().copied(), currency)?)
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    fn check_currency(&mut self, currency: &Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency_static(currency)?);
                Ok(())
            }
        }
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a currency back to its static ISO definition.
fn currency_static(currency: &Currency) -> Result<&'static Currency, FixtureError> {
    rusty_money::iso::find(currency.iso_alpha_code)
        .ok_or_else(|| FixtureError::UnknownCurrency(currency.iso_alpha_code.to_string()))
}
