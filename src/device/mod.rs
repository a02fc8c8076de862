//! Execution contexts and the SIMT-style grid executor.
//!
//! Device kernels are expressed against a two-level hierarchy: a grid of
//! blocks, each block a fixed number of threads, each block owning one tile of
//! the input. [`Stream::launch`] runs a grid on a [`Device`]'s worker threads
//! and callers observe the usual "launch, then synchronize" contract.

use core::fmt;

use serde::{Deserialize, Serialize};

pub mod grid;
pub mod stream;

pub use grid::{Kernel, LaunchConfig, ThreadIdx};
pub use stream::{Device, Stream};

/// Where buffers live and where parallel work runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    /// Host memory, CPU fan-out.
    #[default]
    Cpu,
    /// A GPU device, by ordinal.
    Gpu(u32),
}

impl Context {
    /// Returns `true` for device contexts.
    #[inline]
    pub fn is_gpu(self) -> bool {
        matches!(self, Context::Gpu(_))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Cpu => f.write_str("cpu"),
            Context::Gpu(ordinal) => write!(f, "gpu:{ordinal}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_device() {
        assert_eq!(Context::Cpu.to_string(), "cpu");
        assert_eq!(Context::Gpu(3).to_string(), "gpu:3");
        assert!(Context::Gpu(0).is_gpu());
        assert!(!Context::default().is_gpu());
    }
}
