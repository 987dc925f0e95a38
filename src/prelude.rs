//! Block pricing prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocator::{AllocationContext, AllocationError, AllocationSummary, Allocator},
    blocks::{Block, BlockSequence, BlockSequenceError, TierIndex},
    cart::{AdjustedUnit, Cart, CartError, LineItem, LineKey, NewLine, RecomputeGate},
    categories::{CategoryId, CategorySet},
    config::{AllocationConfig, ConfigError},
    eligibility::{is_counted, is_eligible},
    hooks::{HookError, PricingHooks},
    products::{Catalog, CategoryResolver, Product, ProductKey, ProductKind},
    reducer::{
        Breakdown, BreakdownRow, REPRESENTATIVE_PRICE_DP, ReduceError, breakdown,
        representative_price,
    },
    summary::{CartSummary, SummaryError, SummaryRow},
};
