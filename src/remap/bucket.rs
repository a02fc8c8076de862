//! Slot layouts of the two direct-addressed arrays.

use crate::concurrency::AtomicId;
use crate::{IdType, EMPTY_KEY};

/// Global-to-local slot, indexed by global ID.
///
/// `id` equals the slot's own index once claimed and [`EMPTY_KEY`] otherwise,
/// so it doubles as the claim flag. `local` is [`EMPTY_KEY`] until the
/// claiming thread has stored its local ID.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct O2nBucket {
    pub(crate) id: AtomicId,
    pub(crate) local: AtomicId,
}

impl O2nBucket {
    pub(crate) const fn empty() -> Self {
        Self {
            id: AtomicId::new(EMPTY_KEY),
            local: AtomicId::new(EMPTY_KEY),
        }
    }
}

/// Local-to-global slot, indexed by local ID.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct N2oBucket {
    pub(crate) global: AtomicId,
}

impl N2oBucket {
    pub(crate) const fn empty() -> Self {
        Self {
            global: AtomicId::new(EMPTY_KEY),
        }
    }
}

const _: () = {
    use core::mem;
    assert!(mem::size_of::<O2nBucket>() == 2 * mem::size_of::<IdType>());
    assert!(mem::size_of::<N2oBucket>() == mem::size_of::<IdType>());
};
