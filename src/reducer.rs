//! Price Reducer
//!
//! Read-only projections over a line's block prices: one representative unit
//! price for cart totals, and a grouped breakdown for display.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::cart::{LineItem, LineKey};

/// Decimal places kept on the representative price.
pub const REPRESENTATIVE_PRICE_DP: u32 = 4;

/// Errors raised while reducing a line's block prices.
#[derive(Debug, Error, PartialEq)]
pub enum ReduceError {
    /// Summing or averaging the unit prices overflowed.
    #[error("Price overflow while averaging line {0:?}")]
    Overflow(LineKey),
}

/// The single unit price reported for a line.
///
/// The mean of the block prices, rounded half-up to four decimal places, or the
/// base price when the line has no block prices. Units that fell in different
/// tiers are blended together.
///
/// # Errors
///
/// Returns [`ReduceError::Overflow`] if the sum of unit prices cannot be represented.
pub fn representative_price<'a>(line: &LineItem<'a>) -> Result<Money<'a, Currency>, ReduceError> {
    if !line.is_adjusted() {
        return Ok(*line.price());
    }

    let overflow = || ReduceError::Overflow(line.key());

    let sum = line
        .adjusted_prices()
        .try_fold(Decimal::ZERO, |acc, price| acc.checked_add(*price.amount()))
        .ok_or_else(overflow)?;

    let count = Decimal::from(line.adjusted_units().len());

    let mean = sum
        .checked_div(count)
        .ok_or_else(overflow)?
        .round_dp_with_strategy(REPRESENTATIVE_PRICE_DP, RoundingStrategy::MidpointAwayFromZero);

    Ok(Money::from_decimal(mean, line.price().currency()))
}

/// One row of a price breakdown: a unit price and how many units pay it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakdownRow<'a> {
    /// Unit price
    pub price: Money<'a, Currency>,

    /// Units at this price
    pub quantity: u32,
}

impl fmt::Display for BreakdownRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.price, self.quantity)
    }
}

/// A line's unit prices grouped by value, in the order each price first appears.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown<'a> {
    rows: SmallVec<[BreakdownRow<'a>; 4]>,
}

impl<'a> Breakdown<'a> {
    /// Rows in display order.
    pub fn rows(&self) -> &[BreakdownRow<'a>] {
        &self.rows
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &BreakdownRow<'a>> {
        self.rows.iter()
    }

    /// Units covered by all rows.
    pub fn total_quantity(&self) -> u64 {
        self.rows.iter().map(|row| u64::from(row.quantity)).sum()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the breakdown has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Breakdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{row}")?;
        }

        Ok(())
    }
}

/// Group a line's unit prices for display.
///
/// Block prices are grouped by equal value in first-seen order. Units left at
/// the base price follow as a final row. Returns `None` when the line has no
/// block prices, in which case the host shows its usual single price.
pub fn breakdown<'a>(line: &LineItem<'a>) -> Option<Breakdown<'a>> {
    if !line.is_adjusted() {
        return None;
    }

    let mut rows: SmallVec<[BreakdownRow<'a>; 4]> = SmallVec::new();

    for price in line.adjusted_prices() {
        match rows.iter_mut().find(|row| row.price == *price) {
            Some(row) => row.quantity = row.quantity.saturating_add(1),
            None => rows.push(BreakdownRow {
                price: *price,
                quantity: 1,
            }),
        }
    }

    let remaining = line.unadjusted_quantity();

    if remaining > 0 {
        rows.push(BreakdownRow {
            price: *line.price(),
            quantity: remaining,
        });
    }

    Some(Breakdown { rows })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        cart::{AdjustedUnit, Cart, NewLine},
        products::ProductKey,
    };

    use super::*;

    fn line_with<'a>(
        base_minor: i64,
        quantity: u32,
        adjusted_minor: &[i64],
    ) -> Result<Cart<'a>, crate::cart::CartError> {
        let mut cart = Cart::with_lines(
            [NewLine::new(
                ProductKey::default(),
                Money::from_minor(base_minor, GBP),
                quantity,
            )],
            GBP,
        )?;

        for line in cart.iter_mut() {
            line.set_adjusted(
                adjusted_minor
                    .iter()
                    .zip(1..)
                    .map(|(&minor, tier)| AdjustedUnit {
                        tier,
                        price: Money::from_minor(minor, GBP),
                    })
                    .collect(),
            );
        }

        Ok(cart)
    }

    #[test]
    fn representative_price_is_rounded_mean() -> TestResult {
        let cart = line_with(10_000, 5, &[9_000, 5_000, 2_500, 2_500, 2_500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        assert_eq!(representative_price(line)?, Money::from_minor(4_300, GBP));

        Ok(())
    }

    #[test]
    fn representative_price_rounds_half_up_to_four_places() -> TestResult {
        // (0.01 + 0.02 + 0.02) / 3 = 0.016666...
        let cart = line_with(100, 3, &[1, 2, 2])?;
        let line = cart.iter().next().ok_or("missing line")?;

        let price = representative_price(line)?;

        assert_eq!(*price.amount(), Decimal::new(167, 4));

        Ok(())
    }

    #[test]
    fn representative_price_ignores_unadjusted_units() -> TestResult {
        let cart = line_with(10_000, 5, &[9_000, 5_000, 2_500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        // Mean of the three block prices only; the two base-price units are not blended in.
        assert_eq!(representative_price(line)?, Money::from_minor(5_500, GBP));

        Ok(())
    }

    #[test]
    fn representative_price_without_adjustments_is_base_price() -> TestResult {
        let cart = line_with(1_234, 2, &[])?;
        let line = cart.iter().next().ok_or("missing line")?;

        assert_eq!(representative_price(line)?, Money::from_minor(1_234, GBP));

        Ok(())
    }

    #[test]
    fn breakdown_groups_in_first_seen_order() -> TestResult {
        let cart = line_with(10_000, 5, &[9_000, 5_000, 2_500, 2_500, 2_500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        let breakdown = breakdown(line).ok_or("missing breakdown")?;
        let rows: Vec<(i64, u32)> = breakdown
            .iter()
            .map(|row| (row.price.to_minor_units(), row.quantity))
            .collect();

        assert_eq!(rows, vec![(9_000, 1), (5_000, 1), (2_500, 3)]);
        assert_eq!(breakdown.total_quantity(), 5);

        Ok(())
    }

    #[test]
    fn breakdown_groups_non_adjacent_equal_prices() -> TestResult {
        let cart = line_with(1_000, 3, &[500, 900, 500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        let breakdown = breakdown(line).ok_or("missing breakdown")?;
        let rows: Vec<(i64, u32)> = breakdown
            .iter()
            .map(|row| (row.price.to_minor_units(), row.quantity))
            .collect();

        assert_eq!(rows, vec![(500, 2), (900, 1)]);

        Ok(())
    }

    #[test]
    fn breakdown_appends_base_price_remainder() -> TestResult {
        let cart = line_with(10_000, 5, &[9_000, 5_000, 2_500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        let breakdown = breakdown(line).ok_or("missing breakdown")?;
        let last = breakdown.rows().last().ok_or("missing remainder row")?;

        assert_eq!(breakdown.len(), 4);
        assert_eq!(last.price, Money::from_minor(10_000, GBP));
        assert_eq!(last.quantity, 2);
        assert_eq!(breakdown.total_quantity(), 5);

        Ok(())
    }

    #[test]
    fn breakdown_is_none_without_adjustments() -> TestResult {
        let cart = line_with(10_000, 2, &[])?;
        let line = cart.iter().next().ok_or("missing line")?;

        assert!(breakdown(line).is_none());

        Ok(())
    }

    #[test]
    fn breakdown_renders_one_row_per_line() -> TestResult {
        let cart = line_with(10_000, 5, &[9_000, 5_000, 2_500])?;
        let line = cart.iter().next().ok_or("missing line")?;

        let rendered = breakdown(line).ok_or("missing breakdown")?.to_string();
        let rows: Vec<&str> = rendered.lines().collect();

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.contains(" × ")));
        assert!(rendered.ends_with("× 2"));

        Ok(())
    }
}
