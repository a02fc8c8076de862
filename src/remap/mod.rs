//! Global-to-local ID compaction for sampled subgraphs.

mod bucket;
pub mod table;

pub use table::IdRemapTable;
