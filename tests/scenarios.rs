//! Integration tests for cart-wide block allocation.
//!
//! Every scenario uses the block table `{1: 10%, 2: 50%, 3: 75%}` over hoodies in
//! category 60 priced at £100.00, so the tiers price a unit at £90.00, £50.00 and
//! £25.00 respectively.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use block_pricing::prelude::*;

const HOODIES: u64 = 60;
const MUGS: u64 = 3;

fn config(repeat_last_block: bool) -> Result<AllocationConfig, BlockSequenceError> {
    Ok(AllocationConfig::new(
        CategorySet::from_ids(&[HOODIES]),
        CategorySet::from_ids(&[HOODIES]),
        BlockSequence::new([
            (1, Percentage::from(Decimal::new(10, 2))),
            (2, Percentage::from(Decimal::new(50, 2))),
            (3, Percentage::from(Decimal::new(75, 2))),
        ])?,
        repeat_last_block,
    ))
}

fn gbp(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, GBP)
}

fn tiers(line: &LineItem<'_>) -> Vec<TierIndex> {
    line.adjusted_units().iter().map(|unit| unit.tier).collect()
}

fn prices(line: &LineItem<'_>) -> Vec<i64> {
    line.adjusted_prices().map(Money::to_minor_units).collect()
}

fn rows(line: &LineItem<'_>) -> Vec<(i64, u32)> {
    breakdown(line)
        .map(|breakdown| {
            breakdown
                .iter()
                .map(|row| (row.price.to_minor_units(), row.quantity))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn repeating_last_block_prices_every_unit() -> TestResult {
    let config = config(true)?;
    let mut catalog = Catalog::new();
    let hoodie = catalog.insert(Product::simple(
        "Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));

    let mut cart = Cart::new(GBP);
    let key = cart.add_line(NewLine::new(hoodie, gbp(10_000), 5))?;

    let hooks = PricingHooks::new(&config, &catalog);
    hooks.on_cart_loaded(&mut cart)?;

    let line = cart.line(key)?;

    assert_eq!(prices(line), vec![9_000, 5_000, 2_500, 2_500, 2_500]);
    assert_eq!(hooks.price_for(&cart, key)?, gbp(4_300));
    assert_eq!(rows(line), vec![(9_000, 1), (5_000, 1), (2_500, 3)]);

    Ok(())
}

#[test]
fn exhausted_blocks_leave_remaining_units_at_base_price() -> TestResult {
    let config = config(false)?;
    let mut catalog = Catalog::new();
    let hoodie = catalog.insert(Product::simple(
        "Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));

    let mut cart = Cart::new(GBP);
    let key = cart.add_line(NewLine::new(hoodie, gbp(10_000), 5))?;

    let hooks = PricingHooks::new(&config, &catalog);
    let summary = hooks.on_cart_loaded(&mut cart)?;

    let line = cart.line(key)?;

    assert_eq!(prices(line), vec![9_000, 5_000, 2_500]);
    assert_eq!(line.unadjusted_quantity(), 2);
    assert_eq!(
        rows(line),
        vec![(9_000, 1), (5_000, 1), (2_500, 1), (10_000, 2)]
    );
    assert_eq!(summary.adjusted_units, 3);
    assert_eq!(summary.unadjusted_units, 2);

    // (90 + 50 + 25) / 3
    assert_eq!(
        hooks.price_for(&cart, key)?,
        Money::from_decimal(Decimal::new(550_000, 4), GBP)
    );

    let label = hooks.display_for(&cart, key)?.ok_or("missing label")?;
    assert_eq!(label.lines().count(), 4);

    Ok(())
}

#[test]
fn tier_counter_is_shared_across_lines() -> TestResult {
    let config = config(true)?;
    let mut catalog = Catalog::new();
    let hoodie = catalog.insert(Product::simple(
        "Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));
    let zip = catalog.insert(Product::simple(
        "Zip Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));

    let mut cart = Cart::with_lines(
        [
            NewLine::new(hoodie, gbp(10_000), 2),
            NewLine::new(zip, gbp(10_000), 2),
        ],
        GBP,
    )?;

    Allocator::new(&config, &catalog).allocate(&mut cart)?;

    let mut lines = cart.iter();
    let first = lines.next().ok_or("missing first line")?;
    let second = lines.next().ok_or("missing second line")?;

    assert_eq!(tiers(first), vec![1, 2]);
    assert_eq!(prices(first), vec![9_000, 5_000]);
    assert_eq!(tiers(second), vec![3, 4]);
    assert_eq!(prices(second), vec![2_500, 2_500]);

    Ok(())
}

#[test]
fn ineligible_line_does_not_consume_tiers() -> TestResult {
    let config = config(true)?;
    let mut catalog = Catalog::new();
    let hoodie = catalog.insert(Product::simple(
        "Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));
    let mug = catalog.insert(Product::simple(
        "Mug",
        CategorySet::from_ids(&[MUGS]),
        gbp(800),
    ));

    let allocate = |lines: Vec<NewLine<'static>>| -> TestResult<Vec<Vec<TierIndex>>> {
        let mut cart = Cart::with_lines(lines, GBP)?;
        Allocator::new(&config, &catalog).allocate(&mut cart)?;

        Ok(cart.iter().map(tiers).collect())
    };

    let with_mug = allocate(vec![
        NewLine::new(hoodie, gbp(10_000), 2),
        NewLine::new(mug, gbp(800), 4),
        NewLine::new(hoodie, gbp(10_000), 2),
    ])?;
    let without_mug = allocate(vec![
        NewLine::new(hoodie, gbp(10_000), 2),
        NewLine::new(hoodie, gbp(10_000), 2),
    ])?;

    assert_eq!(with_mug, vec![vec![1, 2], vec![], vec![3, 4]]);
    assert_eq!(
        with_mug.iter().filter(|tiers| !tiers.is_empty()).collect::<Vec<_>>(),
        without_mug.iter().collect::<Vec<_>>()
    );

    Ok(())
}

#[test]
fn later_lines_get_nothing_once_blocks_run_out() -> TestResult {
    let config = config(false)?;
    let mut catalog = Catalog::new();
    let hoodie = catalog.insert(Product::simple(
        "Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(10_000),
    ));
    let zip = catalog.insert(Product::simple(
        "Zip Hoodie",
        CategorySet::from_ids(&[HOODIES]),
        gbp(5_000),
    ));

    let mut cart = Cart::new(GBP);
    let first = cart.add_line(NewLine::new(hoodie, gbp(10_000), 3))?;
    let second = cart.add_line(NewLine::new(zip, gbp(5_000), 2))?;
    let third = cart.add_line(NewLine::new(hoodie, gbp(10_000), 1))?;

    let hooks = PricingHooks::new(&config, &catalog);
    let summary = hooks.on_cart_loaded(&mut cart)?;

    assert_eq!(tiers(cart.line(first)?), vec![1, 2, 3]);

    for key in [second, third] {
        let line = cart.line(key)?;

        assert!(line.adjusted_units().is_empty());
        assert_eq!(breakdown(line), None);
        assert_eq!(hooks.price_for(&cart, key)?, *line.price());
        assert_eq!(hooks.display_for(&cart, key)?, None);
    }

    assert_eq!(summary.eligible_lines, 3);
    assert_eq!(summary.adjusted_units, 3);
    assert_eq!(summary.unadjusted_units, 3);

    Ok(())
}
