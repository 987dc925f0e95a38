//! Eligibility
//!
//! Decides which cart lines take part in block pricing.

use crate::{
    cart::LineItem, categories::CategorySet, config::AllocationConfig, products::CategoryResolver,
};

/// Returns true if the line's product categories intersect the adjust categories.
///
/// Variations are judged by their parent's categories. Missing category data
/// makes a line ineligible rather than raising an error.
pub fn is_eligible<R: CategoryResolver + ?Sized>(
    line: &LineItem<'_>,
    config: &AllocationConfig,
    resolver: &R,
) -> bool {
    matches_any(line, config.adjust_categories(), resolver)
}

/// Returns true if the line's product categories intersect the count categories.
pub fn is_counted<R: CategoryResolver + ?Sized>(
    line: &LineItem<'_>,
    config: &AllocationConfig,
    resolver: &R,
) -> bool {
    matches_any(line, config.count_categories(), resolver)
}

fn matches_any<R: CategoryResolver + ?Sized>(
    line: &LineItem<'_>,
    categories: &CategorySet,
    resolver: &R,
) -> bool {
    resolver
        .categories(line.product())
        .is_some_and(|product_categories| product_categories.intersects(categories))
}
