//! Cart Fixtures

use serde::Deserialize;

/// Wrapper for cart lines in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Lines in cart order
    pub lines: Vec<LineFixture>,
}

/// Cart line fixture
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Key of the product in the catalog fixture
    pub product: String,

    /// Number of units
    pub quantity: u32,

    /// Unit price override (e.g., "95.00 GBP"); defaults to the product price
    #[serde(default)]
    pub price: Option<String>,
}
