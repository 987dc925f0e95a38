//! Block Pricing
//!
//! Tiered unit discounts for a shopping cart: every eligible unit in the cart
//! takes the next tier from a shared block table, and each line is then priced at
//! the average of its units' block prices.

pub mod allocator;
pub mod blocks;
pub mod cart;
pub mod categories;
pub mod config;
pub mod eligibility;
pub mod fixtures;
pub mod hooks;
pub mod prelude;
pub mod products;
pub mod reducer;
pub mod summary;
