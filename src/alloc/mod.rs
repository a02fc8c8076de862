//! Memory service seam and the owned buffers built on top of it.

pub mod allocator;
pub mod buffer;
pub mod heap;

pub use allocator::{AllocError, MemoryService};
pub use buffer::DeviceBuffer;
pub use heap::{SystemMemory, SYSTEM_MEMORY};
