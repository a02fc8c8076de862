//! Runtime knobs for the CPU fan-out and the device grid.
//!
//! Both structs deserialize from JSON with every field optional, so a config
//! file only has to name what it overrides:
//!
//! ```rust
//! use sampling_remap::config::RuntimeConfig;
//!
//! let cfg = RuntimeConfig::from_json_str(r#"{ "parallel": { "num_threads": 4 } }"#).unwrap();
//! assert_eq!(cfg.parallel.num_threads, 4);
//! assert_eq!(cfg.device.block_size, 256);
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// Worker-count configuration for the CPU parallel loops.
///
/// Passed explicitly into every table call through a
/// [`WorkerPool`](crate::concurrency::WorkerPool); changing it only requires
/// building a new pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of worker threads. `0` lets rayon pick (one per logical core).
    pub num_threads: usize,
    /// Minimum number of consecutive elements handed to one worker.
    pub min_chunk: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            min_chunk: 1024,
        }
    }
}

impl ParallelConfig {
    /// Sets the worker count.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Sets the minimum chunk length.
    pub fn with_min_chunk(mut self, min_chunk: usize) -> Self {
        self.min_chunk = min_chunk;
        self
    }
}

/// Grid shape for device kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Threads per block.
    pub block_size: usize,
    /// Elements covered by one block (the tile size).
    pub elements_per_block: usize,
    /// Host threads backing the simulated device. `0` lets rayon pick.
    pub device_threads: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            block_size: 256,
            elements_per_block: 1024,
            device_threads: 0,
        }
    }
}

impl DeviceConfig {
    /// Sets threads per block.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the tile size.
    pub fn with_elements_per_block(mut self, elements_per_block: usize) -> Self {
        self.elements_per_block = elements_per_block;
        self
    }

    /// Sets the number of host threads backing the device.
    pub fn with_device_threads(mut self, device_threads: usize) -> Self {
        self.device_threads = device_threads;
        self
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// CPU fan-out settings.
    pub parallel: ParallelConfig,
    /// Device grid settings.
    pub device: DeviceConfig,
}

impl RuntimeConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?cfg, "loaded runtime config");
        Ok(cfg)
    }
}
