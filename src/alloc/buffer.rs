//! `DeviceBuffer`: an owned, typed buffer living on an execution context.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use super::{AllocError, MemoryService};
use crate::device::Context;

/// A fixed-length buffer of `T` allocated through a [`MemoryService`].
///
/// The buffer is allocated exactly once and released exactly once, on drop.
/// It never grows or shrinks.
pub struct DeviceBuffer<'m, T> {
    ptr: NonNull<T>,
    len: usize,
    context: Context,
    memory: &'m dyn MemoryService,
    _owns: PhantomData<T>,
}

// SAFETY: the buffer uniquely owns its elements; the service is `Sync`.
unsafe impl<'m, T: Send> Send for DeviceBuffer<'m, T> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<'m, T: Sync> Sync for DeviceBuffer<'m, T> {}

fn array_layout<T>(context: Context, len: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(len).map_err(|_| AllocError {
        context,
        bytes: usize::MAX,
    })
}

/// Owns a raw allocation while it is being filled.
///
/// If an initialiser unwinds, the elements written so far are dropped and the
/// memory goes back to the service.
struct InitGuard<'m, T> {
    raw: NonNull<T>,
    written: usize,
    layout: Layout,
    context: Context,
    memory: &'m dyn MemoryService,
}

impl<T> Drop for InitGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: exactly `written` leading elements are initialised, and the
        // allocation came from `memory` with this context and layout.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.raw.as_ptr(), self.written));
            self.memory.deallocate(self.context, self.raw.cast(), self.layout);
        }
    }
}

impl<'m, T> DeviceBuffer<'m, T> {
    /// Allocates `len` elements on `context` and initialises element `i` with `init(i)`.
    ///
    /// If `init` panics, the elements already built are dropped and the memory
    /// is returned to the service before the panic resumes.
    ///
    /// # Errors
    /// Propagates the service's `AllocError`.
    pub fn from_fn(
        memory: &'m dyn MemoryService,
        context: Context,
        len: usize,
        mut init: impl FnMut(usize) -> T,
    ) -> Result<Self, AllocError> {
        let layout = array_layout::<T>(context, len)?;
        let raw = memory.allocate(context, layout)?.cast::<T>();
        let mut guard = InitGuard {
            raw,
            written: 0,
            layout,
            context,
            memory,
        };
        while guard.written < len {
            let value = init(guard.written);
            // SAFETY: `raw` is valid for `len` writes of `T`.
            unsafe { ptr::write(raw.as_ptr().add(guard.written), value) };
            guard.written += 1;
        }
        mem::forget(guard);
        Ok(Self {
            ptr: raw,
            len,
            context,
            memory,
            _owns: PhantomData,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Context the buffer was allocated on.
    #[inline]
    pub fn context(&self) -> Context {
        self.context
    }

    /// Views the buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: all `len` elements were initialised in the constructor.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Views the buffer as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: unique borrow of an initialised allocation.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<'m, T> Deref for DeviceBuffer<'m, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'m, T> DerefMut for DeviceBuffer<'m, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'m, T: fmt::Debug> fmt::Debug for DeviceBuffer<'m, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("context", &self.context)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<'m, T> Drop for DeviceBuffer<'m, T> {
    fn drop(&mut self) {
        // SAFETY: elements are initialised and dropped exactly once here.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
        }
        // The layout was valid at construction, so it is valid now.
        if let Ok(layout) = Layout::array::<T>(self.len) {
            // SAFETY: same service, context and layout as the allocation.
            unsafe { self.memory.deallocate(self.context, self.ptr.cast(), layout) };
        }
    }
}
