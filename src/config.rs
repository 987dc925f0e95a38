//! Allocation Config
//!
//! Which categories take part in block pricing, the block table, and whether the
//! last block repeats once the table runs out.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    blocks::{BlockSequence, BlockSequenceError, TierIndex},
    categories::{CategoryId, CategorySet},
};

/// Errors raised while loading an allocation config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A tier rate could not be represented as a decimal (tier index, raw value).
    #[error("Invalid rate for tier {0}: {1}")]
    InvalidPercentage(TierIndex, f64),

    /// The block table is malformed.
    #[error(transparent)]
    Blocks(#[from] BlockSequenceError),
}

/// Allocation configuration, fixed for the lifetime of a request.
#[derive(Debug, Clone)]
pub struct AllocationConfig {
    adjust_categories: CategorySet,
    count_categories: CategorySet,
    blocks: BlockSequence,
    repeat_last_block: bool,
}

impl AllocationConfig {
    /// Create a new allocation config.
    pub fn new(
        adjust_categories: CategorySet,
        count_categories: CategorySet,
        blocks: BlockSequence,
        repeat_last_block: bool,
    ) -> Self {
        Self {
            adjust_categories,
            count_categories,
            blocks,
            repeat_last_block,
        }
    }

    /// Parse a config from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is malformed or the block table is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: AllocationConfigFile = serde_norway::from_str(yaml)?;

        file.try_into()
    }

    /// Load a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or the block table is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Categories whose products receive block pricing.
    pub fn adjust_categories(&self) -> &CategorySet {
        &self.adjust_categories
    }

    /// Categories whose units are counted across the cart.
    ///
    /// The count is reported in the allocation summary but does not affect pricing.
    pub fn count_categories(&self) -> &CategorySet {
        &self.count_categories
    }

    /// The block table.
    pub fn blocks(&self) -> &BlockSequence {
        &self.blocks
    }

    /// Whether units past the last tier keep receiving the last tier's rate.
    pub fn repeat_last_block(&self) -> bool {
        self.repeat_last_block
    }
}

/// Allocation config as written in YAML.
#[derive(Debug, Deserialize)]
pub struct AllocationConfigFile {
    /// Categories whose products receive block pricing
    pub adjust_categories: Vec<CategoryId>,

    /// Categories whose units are counted
    #[serde(default)]
    pub count_categories: Vec<CategoryId>,

    /// Tier index -> fraction off (e.g. `1: 0.10`)
    pub blocks: FxHashMap<TierIndex, f64>,

    /// Repeat the last block for overflow units
    #[serde(default)]
    pub repeat_last_block: bool,
}

impl TryFrom<AllocationConfigFile> for AllocationConfig {
    type Error = ConfigError;

    fn try_from(file: AllocationConfigFile) -> Result<Self, Self::Error> {
        let tiers = file
            .blocks
            .into_iter()
            .map(|(index, value)| {
                Decimal::from_f64(value)
                    .map(|fraction| (index, Percentage::from(fraction)))
                    .ok_or(ConfigError::InvalidPercentage(index, value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            adjust_categories: file.adjust_categories.into_iter().collect(),
            count_categories: file.count_categories.into_iter().collect(),
            blocks: BlockSequence::new(tiers)?,
            repeat_last_block: file.repeat_last_block,
        })
    }
}
