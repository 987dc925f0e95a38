//! Allocator
//!
//! Walks every eligible unit in the cart, in cart order, and prices each one
//! from the block table. A single tier counter is shared by the whole cart, so
//! earlier lines use up the first tiers and later units draw from deeper ones.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::Money;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    blocks::{BlockSequence, TierIndex, fraction_of},
    cart::{AdjustedUnit, Cart, LineItem, LineKey},
    config::AllocationConfig,
    eligibility::{is_counted, is_eligible},
    products::CategoryResolver,
};

/// Errors raised while allocating block prices.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    /// A unit price could not be represented after applying its block rate.
    #[error("Price overflow while allocating line {0:?}")]
    Overflow(LineKey),
}

/// Outcome of an allocation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationSummary {
    /// True if the snapshot was already allocated and nothing ran.
    pub skipped: bool,

    /// Units in lines matching the count categories.
    pub counted_units: u64,

    /// Lines matching the adjust categories.
    pub eligible_lines: usize,

    /// Eligible units that received a block price.
    pub adjusted_units: u64,

    /// Eligible units left at the base price because the block table ran out.
    pub unadjusted_units: u64,
}

impl AllocationSummary {
    /// Summary for a call that found the snapshot already allocated.
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Per-call allocation state: the cart-wide tier counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationContext {
    next_tier: TierIndex,
}

impl AllocationContext {
    /// Start a fresh walk at tier 1.
    pub fn new() -> Self {
        Self { next_tier: 1 }
    }

    /// The tier the next eligible unit will draw from.
    pub fn next_tier(&self) -> TierIndex {
        self.next_tier
    }

    /// Rate for the next unit, without consuming the tier.
    ///
    /// Falls back to the last block when repeating; otherwise `None` once the
    /// table runs out.
    pub fn peek_rate(&self, blocks: &BlockSequence, repeat_last_block: bool) -> Option<Percentage> {
        blocks.rate(self.next_tier).or_else(|| {
            if repeat_last_block {
                blocks.last_rate()
            } else {
                None
            }
        })
    }

    /// Consume the current tier, returning its index.
    pub fn consume(&mut self) -> TierIndex {
        let tier = self.next_tier;
        self.next_tier = self.next_tier.saturating_add(1);

        tier
    }
}

impl Default for AllocationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Block price allocator for one configuration and catalog.
#[derive(Debug)]
pub struct Allocator<'c, R: ?Sized> {
    config: &'c AllocationConfig,
    resolver: &'c R,
}

impl<'c, R: CategoryResolver + ?Sized> Allocator<'c, R> {
    /// Create an allocator.
    pub fn new(config: &'c AllocationConfig, resolver: &'c R) -> Self {
        Self { config, resolver }
    }

    /// The configuration in use.
    pub fn config(&self) -> &'c AllocationConfig {
        self.config
    }

    /// Allocate block prices across the cart.
    ///
    /// Runs at most once per snapshot: if the cart's gate is already closed the
    /// call returns [`AllocationSummary::skipped`] and leaves every line as it is.
    /// All prices are computed before any line is touched, so an error leaves the
    /// cart and its gate unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Overflow`] if a unit price cannot be represented.
    pub fn allocate(&self, cart: &mut Cart<'_>) -> Result<AllocationSummary, AllocationError> {
        if cart.allocation_done() {
            debug!(lines = cart.len(), "cart already allocated for this snapshot");

            return Ok(AllocationSummary::skipped());
        }

        let (staged, summary) = self.stage(cart)?;

        for (line, units) in cart.iter_mut().zip(staged) {
            line.set_adjusted(units);
        }

        cart.mark_allocated();

        info!(
            lines = cart.len(),
            eligible_lines = summary.eligible_lines,
            counted_units = summary.counted_units,
            adjusted_units = summary.adjusted_units,
            unadjusted_units = summary.unadjusted_units,
            "allocated block prices"
        );

        Ok(summary)
    }

    fn stage<'a>(
        &self,
        cart: &Cart<'a>,
    ) -> Result<(Vec<SmallVec<[AdjustedUnit<'a>; 8]>>, AllocationSummary), AllocationError> {
        let mut context = AllocationContext::new();
        let mut summary = AllocationSummary::default();
        let mut staged = Vec::with_capacity(cart.len());

        for line in cart.iter() {
            if self.resolver.categories(line.product()).is_none() {
                warn!(line = ?line.key(), product = ?line.product(), "no category data for line");
            }

            if is_counted(line, self.config, self.resolver) {
                summary.counted_units += u64::from(line.quantity());
            }

            if !is_eligible(line, self.config, self.resolver) {
                staged.push(SmallVec::new());
                continue;
            }

            let units = self.price_units(line, &mut context)?;
            let adjusted = u64::try_from(units.len()).unwrap_or(u64::MAX);

            debug!(
                line = ?line.key(),
                quantity = line.quantity(),
                adjusted,
                next_tier = context.next_tier(),
                "priced eligible line"
            );

            summary.eligible_lines += 1;
            summary.adjusted_units += adjusted;
            summary.unadjusted_units += u64::from(line.quantity()).saturating_sub(adjusted);

            staged.push(units);
        }

        Ok((staged, summary))
    }

    fn price_units<'a>(
        &self,
        line: &LineItem<'a>,
        context: &mut AllocationContext,
    ) -> Result<SmallVec<[AdjustedUnit<'a>; 8]>, AllocationError> {
        let blocks = self.config.blocks();
        let repeat = self.config.repeat_last_block();
        let base = line.price();
        let mut units = SmallVec::new();

        for _ in 0..line.quantity() {
            let Some(rate) = context.peek_rate(blocks, repeat) else {
                // Table exhausted; the rest of this line stays at the base price.
                break;
            };

            let amount = Decimal::ONE
                .checked_sub(fraction_of(rate))
                .and_then(|multiplier| base.amount().checked_mul(multiplier))
                .ok_or(AllocationError::Overflow(line.key()))?;

            units.push(AdjustedUnit {
                tier: context.consume(),
                price: Money::from_decimal(amount, base.currency()),
            });
        }

        Ok(units)
    }
}
