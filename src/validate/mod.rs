//! Debug-time batch validation on the device grid.
//!
//! Two checks, with deliberately different failure modes:
//! - [`BatchValidator::check_for_duplicates`] logs and counts repeated values
//!   and carries on.
//! - [`BatchValidator::check_sentinel_absent`] panics on the first sentinel it
//!   meets, aborting the computation.
//!
//! Both block until the stream they were launched on has drained.
//!
//! # Presence maps
//! The duplicate check never initialises its presence map. The caller
//! allocates it (see [`presence_map`]), zeroes it before every pass (see
//! [`clear_presence_map`]) and sizes it past the largest value checked.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::alloc::{AllocError, DeviceBuffer, MemoryService};
use crate::concurrency::AtomicId;
use crate::config::DeviceConfig;
use crate::device::{LaunchConfig, Stream};
use crate::IdType;

mod kernels;

use kernels::{DuplicateKernel, SentinelKernel};

/// Launches the validation kernels with a fixed grid shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchValidator {
    config: DeviceConfig,
}

impl BatchValidator {
    /// Creates a validator launching blocks of `config.block_size` threads over
    /// tiles of `config.elements_per_block` elements.
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Creates a validator using the grid shape of the stream's device.
    pub fn for_stream(stream: &Stream<'_>) -> Self {
        Self::new(*stream.device().config())
    }

    /// Grid configuration used by this validator.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn launch_config(&self, len: usize) -> LaunchConfig {
        LaunchConfig::from_config(len, &self.config)
    }

    /// Reports values of `input` that were already marked in `presence`, then
    /// marks every value.
    ///
    /// Returns the number of duplicates reported. Each one is also logged at
    /// `warn` level. Racing threads that hold the same value may both miss it,
    /// so the count is a lower bound.
    ///
    /// # Panics
    /// Panics if a value does not index into `presence`.
    pub fn check_for_duplicates(
        &self,
        stream: &Stream<'_>,
        presence: &[AtomicId],
        input: &[IdType],
    ) -> usize {
        let found = AtomicUsize::new(0);
        let kernel = DuplicateKernel {
            presence,
            input,
            found: &found,
        };
        stream.launch(self.launch_config(input.len()), &kernel);
        stream.synchronize();

        let found = found.load(Ordering::Relaxed);
        if found > 0 {
            tracing::warn!(duplicates = found, len = input.len(), "batch contains duplicates");
        }
        found
    }

    /// Panics if any element of `input` equals `invalid`.
    ///
    /// # Panics
    /// Panics on the first sentinel encountered.
    pub fn check_sentinel_absent(&self, stream: &Stream<'_>, input: &[IdType], invalid: IdType) {
        let kernel = SentinelKernel { input, invalid };
        stream.launch(self.launch_config(input.len()), &kernel);
        stream.synchronize();
    }
}

/// Allocates a zeroed presence map of `len` flags on the stream's context.
///
/// # Errors
/// Propagates the memory service's `AllocError`.
pub fn presence_map<'m>(
    memory: &'m dyn MemoryService,
    stream: &Stream<'_>,
    len: usize,
) -> Result<DeviceBuffer<'m, AtomicId>, AllocError> {
    DeviceBuffer::from_fn(memory, stream.context(), len, |_| AtomicId::new(0))
}

/// Zeroes every flag of a presence map before the next validation pass.
pub fn clear_presence_map(presence: &[AtomicId]) {
    for flag in presence {
        flag.store(0, Ordering::Relaxed);
    }
}

/// Runs [`BatchValidator::check_for_duplicates`] with the stream's grid shape.
pub fn check_for_duplicates(stream: &Stream<'_>, presence: &[AtomicId], input: &[IdType]) -> usize {
    BatchValidator::for_stream(stream).check_for_duplicates(stream, presence, input)
}

/// Runs [`BatchValidator::check_sentinel_absent`] with the stream's grid shape.
pub fn check_sentinel_absent(stream: &Stream<'_>, input: &[IdType], invalid: IdType) {
    BatchValidator::for_stream(stream).check_sentinel_absent(stream, input, invalid);
}
