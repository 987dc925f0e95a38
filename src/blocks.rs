//! Block Sequence
//!
//! An ordered table of discount tiers. Tier `1` applies to the first eligible
//! unit in the cart, tier `2` to the second, and so on.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

/// 1-based tier index.
pub type TierIndex = u32;

/// Errors raised when building a [`BlockSequence`].
#[derive(Debug, Error, PartialEq)]
pub enum BlockSequenceError {
    /// No tiers were provided.
    #[error("block sequence must contain at least one tier")]
    Empty,

    /// Tier indices do not run contiguously from 1 (expected index, found index).
    #[error("expected tier {0}, found tier {1}")]
    NonContiguous(TierIndex, TierIndex),

    /// A tier's fraction is negative or not below 1 (tier index, fraction).
    #[error("tier {0} has fraction {1}, expected 0 <= fraction < 1")]
    FractionOutOfRange(TierIndex, Decimal),
}

/// A single tier: its index and the fraction taken off the unit price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    index: TierIndex,
    rate: Percentage,
}

impl Block {
    /// Tier index
    pub fn index(&self) -> TierIndex {
        self.index
    }

    /// Discount rate
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Discount rate as a plain decimal fraction.
    pub fn fraction(&self) -> Decimal {
        fraction_of(self.rate)
    }
}

/// Contiguous sequence of discount tiers, indexed from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSequence {
    blocks: SmallVec<[Block; 8]>,
}

impl BlockSequence {
    /// Create a block sequence from `(index, rate)` pairs in any order.
    ///
    /// # Errors
    ///
    /// - [`BlockSequenceError::Empty`]: no tiers were given.
    /// - [`BlockSequenceError::NonContiguous`]: indices skip, repeat, or do not start at 1.
    /// - [`BlockSequenceError::FractionOutOfRange`]: a rate is negative or at least 100%.
    pub fn new(
        tiers: impl IntoIterator<Item = (TierIndex, Percentage)>,
    ) -> Result<Self, BlockSequenceError> {
        let mut blocks: SmallVec<[Block; 8]> = tiers
            .into_iter()
            .map(|(index, rate)| Block { index, rate })
            .collect();

        if blocks.is_empty() {
            return Err(BlockSequenceError::Empty);
        }

        blocks.sort_by_key(Block::index);

        let mut expected: TierIndex = 1;

        for block in &blocks {
            if block.index != expected {
                return Err(BlockSequenceError::NonContiguous(expected, block.index));
            }

            let fraction = block.fraction();

            if fraction < Decimal::ZERO || fraction >= Decimal::ONE {
                return Err(BlockSequenceError::FractionOutOfRange(block.index, fraction));
            }

            expected = expected.saturating_add(1);
        }

        Ok(Self { blocks })
    }

    /// Look up the rate for tier `index`.
    pub fn rate(&self, index: TierIndex) -> Option<Percentage> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;

        self.blocks.get(position).map(Block::rate)
    }

    /// The tier with the highest index.
    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Rate of the last tier, used when repeating the final block.
    pub fn last_rate(&self) -> Option<Percentage> {
        self.last().map(Block::rate)
    }

    /// Iterate over the tiers in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the sequence has no tiers.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Convert a percentage into the decimal fraction it represents.
pub(crate) fn fraction_of(rate: Percentage) -> Decimal {
    // decimal_percentage does not expose its inner Decimal
    rate * Decimal::ONE
}
