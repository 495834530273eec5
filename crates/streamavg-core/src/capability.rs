//! Static device properties reported by the capability prober.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Properties of the selected accelerator, queried once at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Name of the platform the device was selected from.
    pub platform_name: String,
    /// Device name.
    pub name: String,
    /// Number of compute units.
    pub compute_units: u32,
    /// Global memory size in bytes.
    pub global_mem_bytes: u64,
    /// Local memory size in bytes.
    pub local_mem_bytes: u64,
    /// Largest single allocation the device accepts, in bytes.
    pub max_alloc_bytes: u64,
    /// True if the device shares physical memory with the host.
    pub unified_memory: bool,
}

impl DeviceCapabilities {
    /// Memory model of the device.
    pub fn memory_model(&self) -> MemoryModel {
        if self.unified_memory {
            MemoryModel::Unified
        } else {
            MemoryModel::Discrete
        }
    }
}

impl fmt::Display for DeviceCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Platform: {}", self.platform_name)?;
        writeln!(f, "Device: {}", self.name)?;
        writeln!(f, "Compute units: {}", self.compute_units)?;
        writeln!(f, "Global memory (bytes): {}", self.global_mem_bytes)?;
        writeln!(f, "Local memory (bytes): {}", self.local_mem_bytes)?;
        writeln!(f, "Max allocation (bytes): {}", self.max_alloc_bytes)?;
        write!(f, "Memory model: {}", self.memory_model())
    }
}

/// Whether device memory is shared with the host or dedicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryModel {
    /// Dedicated device memory; data must be transferred.
    Discrete,
    /// Host and device address the same physical memory.
    Unified,
}

impl fmt::Display for MemoryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryModel::Discrete => write!(f, "discrete"),
            MemoryModel::Unified => write!(f, "unified"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(unified: bool) -> DeviceCapabilities {
        DeviceCapabilities {
            platform_name: "Test Platform".to_string(),
            name: "Test GPU".to_string(),
            compute_units: 8,
            global_mem_bytes: 1 << 30,
            local_mem_bytes: 32 << 10,
            max_alloc_bytes: 256 << 20,
            unified_memory: unified,
        }
    }

    #[test]
    fn test_memory_model() {
        assert_eq!(caps(false).memory_model(), MemoryModel::Discrete);
        assert_eq!(caps(true).memory_model(), MemoryModel::Unified);
    }

    #[test]
    fn test_display_lists_every_property() {
        let text = caps(true).to_string();
        assert!(text.contains("Device: Test GPU"));
        assert!(text.contains("Compute units: 8"));
        assert!(text.contains("Memory model: unified"));
    }
}
