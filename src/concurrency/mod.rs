//! CPU-side concurrency: atomic ID cells and the fork-join worker pool.
//!
//! Nothing here takes a lock. Table operations fan out over a [`WorkerPool`]
//! and coordinate only through [`AtomicId`] compare-and-swap and fetch-add.

pub mod atomic;
pub mod pool;

pub use atomic::AtomicId;
pub use pool::WorkerPool;
