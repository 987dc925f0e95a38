//! Products
//!
//! The product catalog and the category resolution used by eligibility checks.

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};

use crate::categories::CategorySet;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Whether a product stands alone or is a variation of a parent product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    /// A product carrying its own category data.
    Simple,

    /// A variation whose categories live on its parent.
    Variation {
        /// The parent product.
        parent: ProductKey,
    },
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Simple product or variation
    pub kind: ProductKind,

    /// Categories assigned directly to this product. Variations usually leave this empty.
    pub categories: CategorySet,

    /// Product price
    pub price: Money<'a, Currency>,
}

impl<'a> Product<'a> {
    /// Create a simple product.
    pub fn simple(
        name: impl Into<String>,
        categories: CategorySet,
        price: Money<'a, Currency>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ProductKind::Simple,
            categories,
            price,
        }
    }

    /// Create a variation of `parent` with no category data of its own.
    pub fn variation(name: impl Into<String>, parent: ProductKey, price: Money<'a, Currency>) -> Self {
        Self {
            name: name.into(),
            kind: ProductKind::Variation { parent },
            categories: CategorySet::empty(),
            price,
        }
    }
}

/// Resolves the category set used to decide a product's eligibility.
pub trait CategoryResolver {
    /// Return the categories for `product`, following a variation to its parent.
    ///
    /// Returns `None` when the product (or its parent) is unknown.
    fn categories(&self, product: ProductKey) -> Option<&CategorySet>;
}

/// Product catalog
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: SlotMap::with_key(),
        }
    }

    /// Insert a product and return its key.
    pub fn insert(&mut self, product: Product<'a>) -> ProductKey {
        self.products.insert(product)
    }

    /// Get a product by key.
    pub fn get(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Get a product by key, mutably.
    pub fn get_mut(&mut self, key: ProductKey) -> Option<&mut Product<'a>> {
        self.products.get_mut(key)
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl CategoryResolver for Catalog<'_> {
    fn categories(&self, product: ProductKey) -> Option<&CategorySet> {
        let product = self.products.get(product)?;

        match product.kind {
            ProductKind::Simple => Some(&product.categories),
            ProductKind::Variation { parent } => {
                self.products.get(parent).map(|parent| &parent.categories)
            }
        }
    }
}
