//! Devices and ordered command streams.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::{Context, Kernel, LaunchConfig};
use crate::config::DeviceConfig;

/// An execution device: a context plus the workers that run its blocks.
pub struct Device {
    context: Context,
    config: DeviceConfig,
    workers: ThreadPool,
}

impl Device {
    /// Opens a device for `context` with the given grid configuration.
    ///
    /// # Errors
    /// Returns rayon's build error if worker threads cannot be spawned.
    pub fn new(context: Context, config: DeviceConfig) -> Result<Self, ThreadPoolBuildError> {
        let workers = ThreadPoolBuilder::new()
            .num_threads(config.device_threads)
            .thread_name(move |i| format!("{context}-sm{i}"))
            .build()?;
        tracing::debug!(
            %context,
            block_size = config.block_size,
            elements_per_block = config.elements_per_block,
            workers = workers.current_num_threads(),
            "device opened"
        );
        Ok(Self {
            context,
            config,
            workers,
        })
    }

    /// Context this device executes on.
    #[inline]
    pub fn context(&self) -> Context {
        self.context
    }

    /// Grid configuration used for launches sized by element count.
    #[inline]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Creates a new command stream on this device.
    pub fn stream(&self) -> Stream<'_> {
        Stream::new(self)
    }
}

impl core::fmt::Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("context", &self.context)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct StreamState {
    launches: u64,
}

/// An ordered command queue on a [`Device`].
///
/// Launches on one stream execute in issue order, one at a time. Launches on
/// different streams of the same device may run concurrently and are not
/// ordered relative to each other.
pub struct Stream<'d> {
    device: &'d Device,
    queue: Mutex<StreamState>,
}

impl<'d> Stream<'d> {
    /// Creates an empty stream on `device`.
    pub fn new(device: &'d Device) -> Self {
        Self {
            device,
            queue: Mutex::new(StreamState::default()),
        }
    }

    /// Device this stream belongs to.
    #[inline]
    pub fn device(&self) -> &'d Device {
        self.device
    }

    /// Context of the owning device.
    #[inline]
    pub fn context(&self) -> Context {
        self.device.context
    }

    /// Number of grids launched on this stream so far.
    pub fn launches(&self) -> u64 {
        self.lock().launches
    }

    // A kernel that panicked poisons the queue; the stream itself stays usable.
    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launches `kernel` over the grid described by `config`.
    ///
    /// Blocks are distributed over the device workers; the threads of one block
    /// run in order on the same worker. A panic in any thread of the kernel
    /// aborts the launch and resumes on the caller.
    pub fn launch<K: Kernel + ?Sized>(&self, config: LaunchConfig, kernel: &K) {
        let mut state = self.lock();
        if config.grid_dim > 0 {
            self.device.workers.install(|| {
                (0..config.grid_dim).into_par_iter().for_each(|block_idx| {
                    for thread_idx in 0..config.block_dim {
                        kernel.run(config.thread(block_idx, thread_idx));
                    }
                });
            });
        }
        state.launches += 1;
        tracing::trace!(
            context = %self.device.context,
            grid_dim = config.grid_dim,
            block_dim = config.block_dim,
            len = config.len,
            "kernel launched"
        );
    }

    /// Waits until every launch issued on this stream has completed.
    pub fn synchronize(&self) {
        drop(self.lock());
    }
}

impl core::fmt::Debug for Stream<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stream")
            .field("context", &self.device.context)
            .field("launches", &self.launches())
            .finish()
    }
}
