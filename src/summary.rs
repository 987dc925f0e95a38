//! Cart Summary
//!
//! A printable table of a priced cart: one row per line with its base price,
//! representative unit price and block breakdown, followed by the totals.

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, LineItem},
    products::{Catalog, ProductKey},
    reducer::{ReduceError, breakdown, representative_price},
};

/// Errors that can occur when building or printing a cart summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Reducing a line's prices failed.
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    /// A line refers to a product missing from the catalog.
    #[error("Missing product")]
    MissingProduct(ProductKey),

    /// A line total could not be represented.
    #[error("Price overflow while totalling the cart")]
    Overflow,

    /// IO error
    #[error("IO error")]
    IO,
}

/// One printed line of the summary.
#[derive(Debug, Clone)]
pub struct SummaryRow<'a> {
    /// Product name
    pub name: String,

    /// Units in the line
    pub quantity: u32,

    /// Base unit price
    pub base_price: Money<'a, Currency>,

    /// Representative unit price
    pub unit_price: Money<'a, Currency>,

    /// Rendered breakdown, empty for lines without block prices
    pub breakdown: String,
}

/// Priced cart summary.
#[derive(Debug, Clone)]
pub struct CartSummary<'a> {
    rows: SmallVec<[SummaryRow<'a>; 10]>,
    subtotal: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> CartSummary<'a> {
    /// Build a summary from an allocated cart.
    ///
    /// The total uses each line's representative price times its quantity,
    /// which is what the host charges.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if a product is missing or a total overflows.
    pub fn from_cart(cart: &Cart<'a>, catalog: &Catalog<'_>) -> Result<Self, SummaryError> {
        let mut rows = SmallVec::new();
        let mut subtotal = Decimal::ZERO;
        let mut total = Decimal::ZERO;

        for line in cart.iter() {
            let product = catalog
                .get(line.product())
                .ok_or(SummaryError::MissingProduct(line.product()))?;

            let unit_price = representative_price(line)?;

            subtotal = add_line_total(subtotal, line, line.price())?;
            total = add_line_total(total, line, &unit_price)?;

            rows.push(SummaryRow {
                name: product.name.clone(),
                quantity: line.quantity(),
                base_price: *line.price(),
                unit_price,
                breakdown: breakdown(line).as_ref().map(ToString::to_string).unwrap_or_default(),
            });
        }

        Ok(Self {
            rows,
            subtotal: Money::from_decimal(subtotal, cart.currency()),
            total: Money::from_decimal(total, cart.currency()),
        })
    }

    /// Rows in cart order.
    pub fn rows(&self) -> &[SummaryRow<'a>] {
        &self.rows
    }

    /// Cart total at base prices.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Cart total at representative prices.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Amount saved by block pricing.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_decimal(
            self.subtotal.amount() - self.total.amount(),
            self.subtotal.currency(),
        )
    }

    /// Print the summary table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Product", "Qty", "Base Price", "Unit Price", "Breakdown"]);

        for (idx, row) in self.rows.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                row.name.clone(),
                row.quantity.to_string(),
                format!("{}", row.base_price),
                format!("{}", row.unit_price),
                row.breakdown.clone(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| SummaryError::IO)?;
        writeln!(out, " Subtotal: {}", self.subtotal).map_err(|_err| SummaryError::IO)?;
        writeln!(out, " Total:    {}", self.total).map_err(|_err| SummaryError::IO)?;
        writeln!(out, " Savings:  {}", self.savings()).map_err(|_err| SummaryError::IO)?;

        Ok(())
    }
}

fn add_line_total(
    acc: Decimal,
    line: &LineItem<'_>,
    unit_price: &Money<'_, Currency>,
) -> Result<Decimal, SummaryError> {
    unit_price
        .amount()
        .checked_mul(Decimal::from(line.quantity()))
        .and_then(|line_total| acc.checked_add(line_total))
        .ok_or(SummaryError::Overflow)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        allocator::Allocator,
        blocks::BlockSequence,
        cart::NewLine,
        categories::CategorySet,
        config::AllocationConfig,
        products::Product,
    };

    use super::*;

    fn priced_cart<'a>(catalog: &mut Catalog<'a>) -> TestResult<Cart<'a>> {
        let config = AllocationConfig::new(
            CategorySet::from_ids(&[60]),
            CategorySet::empty(),
            BlockSequence::new([
                (1, Percentage::from(Decimal::new(10, 2))),
                (2, Percentage::from(Decimal::new(50, 2))),
                (3, Percentage::from(Decimal::new(75, 2))),
            ])?,
            true,
        );

        let price = Money::from_minor(10_000, GBP);
        let hoodie = catalog.insert(Product::simple("Hoodie", CategorySet::from_ids(&[60]), price));
        let mug = catalog.insert(Product::simple(
            "Mug",
            CategorySet::from_ids(&[3]),
            Money::from_minor(800, GBP),
        ));

        let mut cart = Cart::with_lines(
            [
                NewLine::new(hoodie, price, 5),
                NewLine::new(mug, Money::from_minor(800, GBP), 2),
            ],
            GBP,
        )?;

        Allocator::new(&config, &*catalog).allocate(&mut cart)?;

        Ok(cart)
    }

    #[test]
    fn totals_use_representative_prices() -> TestResult {
        let mut catalog = Catalog::new();
        let cart = priced_cart(&mut catalog)?;

        let summary = CartSummary::from_cart(&cart, &catalog)?;

        // 5 x 100.00 + 2 x 8.00
        assert_eq!(summary.subtotal(), Money::from_minor(51_600, GBP));
        // 5 x 43.00 + 2 x 8.00
        assert_eq!(summary.total(), Money::from_minor(23_100, GBP));
        assert_eq!(summary.savings(), Money::from_minor(28_500, GBP));
        assert_eq!(summary.rows().len(), 2);

        Ok(())
    }

    #[test]
    fn rows_carry_breakdown_only_for_adjusted_lines() -> TestResult {
        let mut catalog = Catalog::new();
        let cart = priced_cart(&mut catalog)?;

        let summary = CartSummary::from_cart(&cart, &catalog)?;
        let mut rows = summary.rows().iter();
        let hoodie = rows.next().ok_or("missing hoodie row")?;
        let mug = rows.next().ok_or("missing mug row")?;

        assert_eq!(hoodie.breakdown.lines().count(), 3);
        assert!(mug.breakdown.is_empty());
        assert_eq!(mug.unit_price, mug.base_price);

        Ok(())
    }

    #[test]
    fn write_to_renders_products_and_totals() -> TestResult {
        let mut catalog = Catalog::new();
        let cart = priced_cart(&mut catalog)?;

        let mut out = Vec::new();
        CartSummary::from_cart(&cart, &catalog)?.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Hoodie"));
        assert!(output.contains("Mug"));
        assert!(output.contains("Breakdown"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Savings:"));

        Ok(())
    }

    #[test]
    fn missing_product_is_reported() -> TestResult {
        let catalog = Catalog::new();
        let cart = Cart::with_lines(
            [NewLine::new(
                ProductKey::default(),
                Money::from_minor(100, GBP),
                1,
            )],
            GBP,
        )?;

        let result = CartSummary::from_cart(&cart, &catalog);

        assert!(matches!(result, Err(SummaryError::MissingProduct(_))));

        Ok(())
    }
}
