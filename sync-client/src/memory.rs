//! Free-memory probes for admission control.
//!
//! The engine asks a [`MemoryProbe`] how much memory is free before every
//! cycle and skips the cycle when it is below the configured floor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current free-memory reading.
pub trait MemoryProbe {
    /// Bytes currently available to the process.
    fn available_bytes(&mut self) -> u64;
}

/// Reads available memory from the operating system.
pub struct SystemMemory {
    sys: sysinfo::System,
}

impl SystemMemory {
    /// Create a probe. Memory is refreshed on every reading.
    pub fn new() -> Self {
        Self {
            sys: sysinfo::System::new(),
        }
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemory {
    fn available_bytes(&mut self) -> u64 {
        self.sys.refresh_memory();
        self.sys.available_memory()
    }
}

/// A settable reading, for tests and for hosts that track their own heap.
///
/// Clones share the reading.
#[derive(Debug, Clone)]
pub struct FixedMemory {
    bytes: Arc<AtomicU64>,
}

impl FixedMemory {
    /// Create a probe that reports `bytes`.
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: Arc::new(AtomicU64::new(bytes)),
        }
    }

    /// Change the reported value.
    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }
}

impl MemoryProbe for FixedMemory {
    fn available_bytes(&mut self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
