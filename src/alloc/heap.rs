//! `SystemMemory`: the default memory service, backed by the global allocator.
//!
//! Device contexts are served from host memory as well; the grid executor in
//! [`crate::device`] runs kernels on the host, so any context can address it.

use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::alloc::{alloc, dealloc};

use super::{AllocError, MemoryService};
use crate::device::Context;

/// A memory service wrapping `std::alloc` with live-allocation accounting.
///
/// Zero-sized requests never touch the global allocator: they return a
/// dangling, well-aligned pointer and freeing it is a no-op.
#[derive(Debug, Default)]
pub struct SystemMemory {
    live_bytes: AtomicUsize,
    live_allocations: AtomicUsize,
}

impl SystemMemory {
    /// Creates a new system memory service with zeroed counters.
    pub const fn new() -> Self {
        Self {
            live_bytes: AtomicUsize::new(0),
            live_allocations: AtomicUsize::new(0),
        }
    }

    /// Bytes currently allocated through this service and not yet freed.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }

    /// Number of outstanding non-empty allocations.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::Acquire)
    }
}

/// Process-wide instance used by convenience constructors.
pub static SYSTEM_MEMORY: SystemMemory = SystemMemory::new();

impl MemoryService for SystemMemory {
    fn allocate(&self, context: Context, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            // SAFETY: alignment is a non-zero power of two, so this address is non-null.
            return Ok(unsafe { NonNull::new_unchecked(layout.align() as *mut u8) });
        }

        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(AllocError {
            context,
            bytes: layout.size(),
        })?;

        self.live_bytes.fetch_add(layout.size(), Ordering::AcqRel);
        self.live_allocations.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(%context, bytes = layout.size(), "allocated buffer");
        Ok(ptr)
    }

    unsafe fn deallocate(&self, context: Context, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: caller guarantees `ptr` came from `allocate` with this layout.
        dealloc(ptr.as_ptr(), layout);
        self.live_bytes.fetch_sub(layout.size(), Ordering::AcqRel);
        self.live_allocations.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(%context, bytes = layout.size(), "freed buffer");
    }
}
