//! Categories
//!
//! Opaque category identifiers and a small sorted set used for eligibility checks.

use std::{cmp::Ordering, fmt};

use serde::Deserialize;
use smallvec::SmallVec;

/// Opaque category identifier assigned by the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CategoryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A sorted, de-duplicated set of category identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    ids: SmallVec<[CategoryId; 5]>,
}

impl CategorySet {
    /// Create a new category set, sorting and removing duplicates.
    #[must_use]
    pub fn new(ids: SmallVec<[CategoryId; 5]>) -> Self {
        let mut set = Self { ids };

        set.ids.sort_unstable();
        set.ids.dedup();

        set
    }

    /// Create an empty category set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ids: SmallVec::new(),
        }
    }

    /// Create a category set from raw identifiers.
    pub fn from_ids(ids: &[u64]) -> Self {
        Self::new(ids.iter().copied().map(CategoryId).collect())
    }

    /// Check whether the two sets share at least one category.
    pub fn intersects(&self, other: &Self) -> bool {
        // Two pointers over sorted ids, O(n + m).
        let mut left = self.ids.iter();
        let mut right = other.ids.iter();
        let mut left_id = left.next();
        let mut right_id = right.next();

        while let (Some(l), Some(r)) = (left_id, right_id) {
            match l.cmp(r) {
                Ordering::Equal => return true,
                Ordering::Less => left_id = left.next(),
                Ordering::Greater => right_id = right.next(),
            }
        }

        false
    }

    /// Return the categories present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut ids = SmallVec::new();
        let mut left = self.ids.iter();
        let mut right = other.ids.iter();
        let mut left_id = left.next();
        let mut right_id = right.next();

        while let (Some(l), Some(r)) = (left_id, right_id) {
            match l.cmp(r) {
                Ordering::Equal => {
                    ids.push(*l);
                    left_id = left.next();
                    right_id = right.next();
                }
                Ordering::Less => left_id = left.next(),
                Ordering::Greater => right_id = right.next(),
            }
        }

        Self { ids }
    }

    /// Check if the set contains a category.
    pub fn contains(&self, id: CategoryId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Add a category, keeping the set sorted.
    pub fn add(&mut self, id: CategoryId) {
        if let Err(pos) = self.ids.binary_search(&id) {
            self.ids.insert(pos, id);
        }
    }

    /// Remove a category if present.
    pub fn remove(&mut self, id: CategoryId) {
        if let Ok(pos) = self.ids.binary_search(&id) {
            self.ids.remove(pos);
        }
    }

    /// Iterate over the categories in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.ids.iter().copied()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of categories in the set.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<CategoryId> for CategorySet {
    fn from_iter<I: IntoIterator<Item = CategoryId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for id in &self.ids {
            if first {
                first = false;
            } else {
                f.write_str(", ")?;
            }

            write!(f, "{id}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_and_dedups() {
        let set = CategorySet::from_ids(&[60, 3, 60, 12]);

        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![CategoryId(3), CategoryId(12), CategoryId(60)]
        );
    }

    #[test]
    fn intersects_finds_shared_category() {
        let product = CategorySet::from_ids(&[1, 7, 60]);
        let adjust = CategorySet::from_ids(&[60]);
        let other = CategorySet::from_ids(&[2, 8]);

        assert!(product.intersects(&adjust));
        assert!(!product.intersects(&other));
    }

    #[test]
    fn empty_set_never_intersects() {
        let empty = CategorySet::empty();
        let adjust = CategorySet::from_ids(&[60]);

        assert!(!empty.intersects(&adjust));
        assert!(!adjust.intersects(&empty));
    }

    #[test]
    fn intersection_keeps_common_ids() {
        let left = CategorySet::from_ids(&[1, 2, 3, 60]);
        let right = CategorySet::from_ids(&[3, 60, 90]);

        assert_eq!(left.intersection(&right), CategorySet::from_ids(&[3, 60]));
    }

    #[test]
    fn add_and_remove_keep_order() {
        let mut set = CategorySet::from_ids(&[10, 30]);

        set.add(CategoryId(20));
        set.add(CategoryId(20));
        assert_eq!(set.len(), 3);
        assert!(set.contains(CategoryId(20)));

        set.remove(CategoryId(10));
        assert!(!set.contains(CategoryId(10)));
        assert_eq!(set.to_string(), "20, 30");
    }
}
