//! Device kernels backing [`BatchValidator`](super::BatchValidator).

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::concurrency::AtomicId;
use crate::device::{Kernel, ThreadIdx};
use crate::IdType;

/// Marks each input value in a presence map and counts values already marked.
pub(crate) struct DuplicateKernel<'a> {
    pub(crate) presence: &'a [AtomicId],
    pub(crate) input: &'a [IdType],
    pub(crate) found: &'a AtomicUsize,
}

impl Kernel for DuplicateKernel<'_> {
    fn run(&self, thread: ThreadIdx) {
        for idx in thread.strided() {
            let value = self.input[idx];
            let flag = self.presence.get(value as usize).unwrap_or_else(|| {
                panic!(
                    "value {value} at index {idx} exceeds presence map of length {}",
                    self.presence.len()
                )
            });
            // Load and store are separate steps: two threads holding the same
            // value can both see 0 and the duplicate goes unreported.
            if flag.load(Ordering::Relaxed) != 0 {
                tracing::warn!(index = idx, value, "duplicate value in batch");
                self.found.fetch_add(1, Ordering::Relaxed);
            }
            flag.store(1, Ordering::Relaxed);
        }
    }
}

/// Aborts the launch if any input equals `invalid`.
pub(crate) struct SentinelKernel<'a> {
    pub(crate) input: &'a [IdType],
    pub(crate) invalid: IdType,
}

impl Kernel for SentinelKernel<'_> {
    fn run(&self, thread: ThreadIdx) {
        for idx in thread.strided() {
            assert!(
                self.input[idx] != self.invalid,
                "invalid value {} found at index {idx}",
                self.invalid
            );
        }
    }
}
