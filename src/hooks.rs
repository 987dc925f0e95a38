//! Pricing Hooks
//!
//! The three entry points a host commerce platform calls into: once when a cart
//! snapshot is loaded, and per line when it needs a unit price or a price label.
//! Registration with the host's event system is left to the caller.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    allocator::{AllocationError, AllocationSummary, Allocator},
    cart::{Cart, LineItem, LineKey},
    config::AllocationConfig,
    products::CategoryResolver,
    reducer::{ReduceError, breakdown, representative_price},
};

/// Errors surfaced through the pricing hooks.
#[derive(Debug, Error, PartialEq)]
pub enum HookError {
    /// The queried line is not in the cart.
    #[error("Unknown cart line {0:?}")]
    UnknownLine(LineKey),

    /// Allocation failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Reducing a line's prices failed.
    #[error(transparent)]
    Reduce(#[from] ReduceError),
}

/// Block pricing hooks bound to one configuration and catalog.
#[derive(Debug)]
pub struct PricingHooks<'c, R: ?Sized> {
    allocator: Allocator<'c, R>,
}

impl<'c, R: CategoryResolver + ?Sized> PricingHooks<'c, R> {
    /// Create the hooks.
    pub fn new(config: &'c AllocationConfig, resolver: &'c R) -> Self {
        Self {
            allocator: Allocator::new(config, resolver),
        }
    }

    /// Called after the host loads a cart snapshot.
    ///
    /// Allocates block prices once per snapshot; repeated calls for the same
    /// snapshot are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Allocation`] if allocation fails.
    pub fn on_cart_loaded(&self, cart: &mut Cart<'_>) -> Result<AllocationSummary, HookError> {
        Ok(self.allocator.allocate(cart)?)
    }

    /// The unit price the host should use for a line.
    ///
    /// # Errors
    ///
    /// - [`HookError::UnknownLine`]: the key is not in the cart.
    /// - [`HookError::Reduce`]: averaging the line's block prices overflowed.
    pub fn price_for<'a>(
        &self,
        cart: &Cart<'a>,
        key: LineKey,
    ) -> Result<Money<'a, Currency>, HookError> {
        let line = find_line(cart, key)?;

        Ok(representative_price(line)?)
    }

    /// The price label for a line, one `price × quantity` row per breakdown group.
    ///
    /// Returns `None` when the line has no block prices, so the host renders its
    /// default label.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::UnknownLine`] if the key is not in the cart.
    pub fn display_for(&self, cart: &Cart<'_>, key: LineKey) -> Result<Option<String>, HookError> {
        let line = find_line(cart, key)?;

        Ok(breakdown(line).as_ref().map(ToString::to_string))
    }
}

fn find_line<'c, 'a>(cart: &'c Cart<'a>, key: LineKey) -> Result<&'c LineItem<'a>, HookError> {
    cart.line(key).map_err(|_err| HookError::UnknownLine(key))
}
