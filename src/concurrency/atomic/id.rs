use core::sync::atomic::{AtomicU32, Ordering};

use crate::IdType;

/// An atomic cell holding one [`IdType`].
///
/// Every slot of the remap table and every presence flag of the validator is
/// one of these. The wrapper is `repr(transparent)` so a buffer of cells has
/// the same layout as a buffer of plain IDs.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct AtomicId {
    inner: AtomicU32,
}

impl AtomicId {
    /// Creates a new atomic ID cell.
    #[inline(always)]
    pub const fn new(value: IdType) -> Self {
        Self {
            inner: AtomicU32::new(value),
        }
    }

    /// Loads the current value.
    #[inline(always)]
    pub fn load(&self, order: Ordering) -> IdType {
        self.inner.load(order)
    }

    /// Stores a new value.
    #[inline(always)]
    pub fn store(&self, value: IdType, order: Ordering) {
        self.inner.store(value, order);
    }

    /// Stores a value if the current value equals `current`.
    #[inline(always)]
    pub fn compare_exchange(
        &self,
        current: IdType,
        new: IdType,
        success: Ordering,
        failure: Ordering,
    ) -> Result<IdType, IdType> {
        self.inner.compare_exchange(current, new, success, failure)
    }

    /// Adds to the current value, returning the previous value.
    #[inline(always)]
    pub fn fetch_add(&self, value: IdType, order: Ordering) -> IdType {
        self.inner.fetch_add(value, order)
    }

    /// Performs a compare-exchange with `AcqRel` on success and `Acquire` on failure.
    ///
    /// This is the claim primitive: exactly one of any number of racing callers
    /// moving the cell away from `current` observes `Ok`.
    #[inline(always)]
    pub fn compare_exchange_cas(&self, current: IdType, new: IdType) -> Result<IdType, IdType> {
        self.compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
    }

    /// Consumes the cell, returning the contained value.
    #[inline]
    pub fn into_inner(self) -> IdType {
        self.inner.into_inner()
    }
}
