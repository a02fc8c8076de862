//! The `MemoryService` trait and its error type.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::device::Context;

/// A memory service that hands out raw buffers on an execution context.
///
/// This is the seam between the sampling core and whatever owns device memory
/// (a caching GPU allocator, pinned host memory, plain heap). Implementations
/// must be thread-safe: tables and buffers may be created from several
/// pipeline threads at once.
pub trait MemoryService: Sync {
    /// Allocates memory for `layout` on `context`.
    ///
    /// # Errors
    /// Returns `AllocError` if the service cannot satisfy the request.
    fn allocate(&self, context: Context, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Releases memory previously returned by [`MemoryService::allocate`].
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this service with the same
    /// `context` and `layout`, and must not be freed twice.
    unsafe fn deallocate(&self, context: Context, ptr: NonNull<u8>, layout: Layout);
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// Context the request was issued on.
    pub context: Context,
    /// Number of bytes requested.
    pub bytes: usize,
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "memory allocation of {} bytes failed on {}",
            self.bytes, self.context
        )
    }
}

impl std::error::Error for AllocError {}
