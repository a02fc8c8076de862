//! # `sampling-remap` - ID Compaction for GNN Mini-Batches
//!
//! The ID-compaction layer of a graph-sampling engine. Samplers emit node IDs
//! in the full graph's sparse, global numbering; feature gathers and dense
//! kernels want a small, contiguous local numbering per batch. This crate
//! builds and serves that renumbering, and offers device-side checks that a
//! batch is well formed before it reaches training.
//!
//! ## Components
//!
//! 1. **`IdRemapTable`** ([`remap`]):
//!    - Direct-addressed by global ID, fixed capacity, no hashing or probing
//!    - Lock-free claims: one CAS per key, one fetch-add per new local ID
//!    - Many concurrent writers; duplicates absorbed silently
//!    - Reset in place between batches, no reallocation
//!
//! 2. **`BatchValidator`** ([`validate`]):
//!    - Tile-parallel kernels on a SIMT-style grid ([`device`])
//!    - Duplicate detection (logged, non-fatal)
//!    - Sentinel detection (fatal)
//!
//! 3. **Plumbing**:
//!    - [`alloc`]: the memory-service seam and owned device buffers
//!    - [`concurrency`]: atomic ID cells and the rayon-backed worker pool
//!    - [`config`]: serde-loadable worker counts and grid shapes
//!
//! ## Failure Model
//!
//! Precondition violations (IDs past capacity, reads past the mapped range,
//! mismatched edge arrays) panic. There is no recoverable error path for
//! malformed batches. Allocation failures surface as [`AllocError`] from the
//! fallible constructors.
//!
//! ## Example
//!
//! ```rust
//! use sampling_remap::{IdRemapTable, WorkerPool};
//!
//! let pool = WorkerPool::with_threads(2).unwrap();
//! let mut table = IdRemapTable::new(10);
//!
//! table.populate(&pool, &[3, 5, 3, 7]);
//! assert_eq!(table.num_items(), 3);
//!
//! let nodes = table.unique_nodes(&pool);
//! let (mut src, mut dst) = ([0; 2], [0; 2]);
//! table.map_edges(&pool, &[3, 5], &[5, 7], &mut src, &mut dst);
//! assert_eq!(nodes[src[0] as usize], 3);
//! assert_eq!(nodes[dst[1] as usize], 7);
//!
//! table.reset(&pool);
//! assert!(table.is_empty());
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod alloc;
pub mod concurrency;
pub mod config;
pub mod device;
pub mod remap;
pub mod validate;

pub use alloc::{AllocError, DeviceBuffer, MemoryService, SystemMemory};
pub use concurrency::{AtomicId, WorkerPool};
pub use config::{DeviceConfig, ParallelConfig, RuntimeConfig};
pub use device::{Context, Device, Stream};
pub use remap::IdRemapTable;
pub use validate::BatchValidator;

/// Width used for global IDs, local IDs and counts.
pub type IdType = u32;

/// Marks an unclaimed slot. Lies outside every valid key domain.
pub const EMPTY_KEY: IdType = IdType::MAX;

const _: () = {
    use core::mem;

    // Buffers of atomic cells share the layout of plain ID arrays.
    assert!(mem::size_of::<AtomicId>() == mem::size_of::<IdType>());
    assert!(mem::align_of::<AtomicId>() == mem::align_of::<IdType>());
};
