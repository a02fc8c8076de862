//! Lock-free atomic cells sized to the crate's ID width.

/// Atomic [`crate::IdType`] cell.
pub mod id;

pub use id::AtomicId;
