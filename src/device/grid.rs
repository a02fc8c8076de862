//! Grid shapes, thread coordinates and the kernel trait.

use core::iter::StepBy;
use core::ops::Range;

use crate::config::DeviceConfig;

/// Shape of one kernel launch.
///
/// The input of `len` elements is cut into tiles of `tile_size`; block `b`
/// owns `[b * tile_size, min((b + 1) * tile_size, len))`. Threads of a block
/// stride through their tile by `block_dim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of blocks.
    pub grid_dim: usize,
    /// Threads per block.
    pub block_dim: usize,
    /// Elements per block.
    pub tile_size: usize,
    /// Total number of input elements.
    pub len: usize,
}

impl LaunchConfig {
    /// Computes the grid needed to cover `len` elements.
    ///
    /// # Panics
    /// Panics if `block_dim` or `tile_size` is zero.
    pub fn for_elements(len: usize, block_dim: usize, tile_size: usize) -> Self {
        assert!(block_dim > 0, "block_dim must be > 0");
        assert!(tile_size > 0, "tile_size must be > 0");
        Self {
            grid_dim: len.div_ceil(tile_size),
            block_dim,
            tile_size,
            len,
        }
    }

    /// Computes the grid for `len` elements using a device configuration.
    pub fn from_config(len: usize, config: &DeviceConfig) -> Self {
        Self::for_elements(len, config.block_size, config.elements_per_block)
    }

    /// Coordinates of thread `thread_idx` in block `block_idx`.
    #[inline]
    pub fn thread(&self, block_idx: usize, thread_idx: usize) -> ThreadIdx {
        let tile_start = block_idx * self.tile_size;
        let tile_end = (tile_start + self.tile_size).min(self.len);
        ThreadIdx {
            block_idx,
            thread_idx,
            block_dim: self.block_dim,
            grid_dim: self.grid_dim,
            tile_start,
            tile_end,
        }
    }
}

/// Coordinates of one SIMT thread within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadIdx {
    /// Block index within the grid.
    pub block_idx: usize,
    /// Thread index within the block.
    pub thread_idx: usize,
    /// Threads per block.
    pub block_dim: usize,
    /// Blocks in the grid.
    pub grid_dim: usize,
    tile_start: usize,
    tile_end: usize,
}

impl ThreadIdx {
    /// Flattened global thread index.
    #[inline]
    pub fn global(&self) -> usize {
        self.block_idx * self.block_dim + self.thread_idx
    }

    /// Element indices this thread handles: its lane of the block's tile,
    /// clipped to the input length.
    #[inline]
    pub fn strided(&self) -> StepBy<Range<usize>> {
        let start = (self.tile_start + self.thread_idx).min(self.tile_end);
        (start..self.tile_end).step_by(self.block_dim)
    }
}

/// A device kernel, executed once per thread of the grid.
pub trait Kernel: Sync {
    /// Body of the kernel for one thread.
    fn run(&self, thread: ThreadIdx);
}

impl<F> Kernel for F
where
    F: Fn(ThreadIdx) + Sync,
{
    #[inline]
    fn run(&self, thread: ThreadIdx) {
        self(thread)
    }
}
