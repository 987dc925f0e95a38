//! Recompute Gate
//!
//! Ensures block allocation runs once per loaded cart snapshot.

/// Allocation state for the current cart snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecomputeGate {
    /// A new snapshot has been loaded and has not been allocated yet.
    #[default]
    Pending,

    /// The snapshot has been allocated; further allocation calls are no-ops.
    Done,
}

impl RecomputeGate {
    /// Returns true if allocation still has to run for this snapshot.
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    /// Returns true if allocation has already run for this snapshot.
    pub fn is_done(self) -> bool {
        self == Self::Done
    }

    /// Mark the current snapshot as allocated.
    pub(crate) fn close(&mut self) {
        *self = Self::Done;
    }

    /// Re-arm the gate for a new snapshot.
    pub(crate) fn rearm(&mut self) {
        *self = Self::Pending;
    }
}
