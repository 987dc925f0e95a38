//! Cart

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{blocks::TierIndex, products::ProductKey};

pub mod gate;

pub use gate::RecomputeGate;

new_key_type! {
    /// Stable identity of a line in the cart.
    pub struct LineKey;
}

/// Errors related to cart construction.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (line index, line currency, cart currency).
    #[error("Line {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line has a negative base price (line index).
    #[error("Line {0} has a negative price")]
    NegativePrice(usize),

    /// No line with this key exists in the current snapshot.
    #[error("Line {0:?} not found")]
    LineNotFound(LineKey),
}

/// A unit that received a block price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedUnit<'a> {
    /// Value of the cart-wide tier counter when this unit was priced.
    pub tier: TierIndex,

    /// Unit price after the block discount.
    pub price: Money<'a, Currency>,
}

/// A line to be placed into a cart snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewLine<'a> {
    /// The product in the line (may be a variation).
    pub product: ProductKey,

    /// Base unit price
    pub price: Money<'a, Currency>,

    /// Number of units
    pub quantity: u32,
}

impl<'a> NewLine<'a> {
    /// Create a new line.
    pub fn new(product: ProductKey, price: Money<'a, Currency>, quantity: u32) -> Self {
        Self {
            product,
            price,
            quantity,
        }
    }
}

/// One cart entry: a product, its base unit price and quantity, plus any block prices.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    key: LineKey,
    product: ProductKey,
    price: Money<'a, Currency>,
    quantity: u32,
    adjusted: SmallVec<[AdjustedUnit<'a>; 8]>,
}

impl<'a> LineItem<'a> {
    /// Line key
    pub fn key(&self) -> LineKey {
        self.key
    }

    /// Product key
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Base unit price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Number of units
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Units that received a block price, in the order they were priced.
    ///
    /// Shorter than the quantity when the block table ran out; the trailing
    /// units keep the base price.
    pub fn adjusted_units(&self) -> &[AdjustedUnit<'a>] {
        &self.adjusted
    }

    /// Adjusted unit prices, in unit order.
    pub fn adjusted_prices(&self) -> impl Iterator<Item = &Money<'a, Currency>> {
        self.adjusted.iter().map(|unit| &unit.price)
    }

    /// Returns true if any unit in the line has a block price.
    pub fn is_adjusted(&self) -> bool {
        !self.adjusted.is_empty()
    }

    /// Number of units still at the base price.
    pub fn unadjusted_quantity(&self) -> u32 {
        let adjusted = u32::try_from(self.adjusted.len()).unwrap_or(u32::MAX);

        self.quantity.saturating_sub(adjusted)
    }

    pub(crate) fn set_adjusted(&mut self, units: SmallVec<[AdjustedUnit<'a>; 8]>) {
        self.adjusted = units;
    }

    pub(crate) fn clear_adjustments(&mut self) {
        self.adjusted.clear();
    }
}

/// Cart
///
/// Lines are kept in the order they were added; allocation walks them in that order.
#[derive(Debug)]
pub struct Cart<'a> {
    lines: Vec<LineItem<'a>>,
    keys: SlotMap<LineKey, usize>,
    currency: &'static Currency,
    gate: RecomputeGate,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            lines: Vec::new(),
            keys: SlotMap::with_key(),
            currency,
            gate: RecomputeGate::Pending,
        }
    }

    /// Create a cart holding the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if any line has a mismatched currency or a negative price.
    pub fn with_lines(
        lines: impl IntoIterator<Item = NewLine<'a>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let mut cart = Self::new(currency);

        cart.load_snapshot(lines)?;

        Ok(cart)
    }

    /// Replace the cart contents with a newly loaded snapshot and re-arm the gate.
    ///
    /// Existing line keys are invalidated. Nothing changes if validation fails.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if any line has a mismatched currency or a negative price.
    pub fn load_snapshot(
        &mut self,
        lines: impl IntoIterator<Item = NewLine<'a>>,
    ) -> Result<(), CartError> {
        let lines: Vec<NewLine<'a>> = lines.into_iter().collect();

        lines
            .iter()
            .enumerate()
            .try_for_each(|(i, line)| self.validate(i, line))?;

        self.lines.clear();
        self.keys.clear();

        for line in lines {
            self.push(line);
        }

        self.gate.rearm();

        Ok(())
    }

    /// Add a line to the cart. The snapshot changes, so the gate is re-armed.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the line has a mismatched currency or a negative price.
    pub fn add_line(&mut self, line: NewLine<'a>) -> Result<LineKey, CartError> {
        self.validate(self.lines.len(), &line)?;

        let key = self.push(line);
        self.gate.rearm();

        Ok(key)
    }

    /// Get a line by key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the key is not part of the current snapshot.
    pub fn line(&self, key: LineKey) -> Result<&LineItem<'a>, CartError> {
        self.keys
            .get(key)
            .and_then(|&index| self.lines.get(index))
            .ok_or(CartError::LineNotFound(key))
    }

    /// Iterate over the lines in cart order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem<'a>> {
        self.lines.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LineItem<'a>> {
        self.lines.iter_mut()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Allocation state of the current snapshot.
    pub fn gate(&self) -> RecomputeGate {
        self.gate
    }

    /// Returns true once allocation has run for the current snapshot.
    pub fn allocation_done(&self) -> bool {
        self.gate.is_done()
    }

    /// Drop every line's block prices and re-arm the gate so the snapshot can be
    /// allocated again.
    pub fn clear_adjustments(&mut self) {
        self.lines.iter_mut().for_each(LineItem::clear_adjustments);
        self.gate.rearm();
    }

    pub(crate) fn mark_allocated(&mut self) {
        self.gate.close();
    }

    fn validate(&self, index: usize, line: &NewLine<'a>) -> Result<(), CartError> {
        let line_currency = line.price.currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                index,
                line_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if *line.price.amount() < Decimal::ZERO {
            return Err(CartError::NegativePrice(index));
        }

        Ok(())
    }

    fn push(&mut self, line: NewLine<'a>) -> LineKey {
        let key = self.keys.insert(self.lines.len());

        self.lines.push(LineItem {
            key,
            product: line.product,
            price: line.price,
            quantity: line.quantity,
            adjusted: SmallVec::new(),
        });

        key
    }
}
