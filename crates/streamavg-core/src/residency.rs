//! Memory residency strategy.
//!
//! Decides vector capacity and buffer placement from the probed
//! [`DeviceCapabilities`] before any buffer is created. The capacity is
//! half the device's largest single allocation, counted in `f64` units
//! even though elements are stored as `f32`. That headroom is kept as is.
//! Unified-memory devices halve the capacity again because host and device
//! share one physical budget.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{DeviceCapabilities, MemoryModel};
use crate::error::{Result, StreamAvgError};

/// Where a buffer lives and how the device may access it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPlacement {
    /// Device-exclusive memory, written by kernels.
    DeviceWriteOnly,
    /// Device-exclusive memory, read by kernels.
    DeviceReadOnly,
    /// Host-allocated memory visible to the device, read and written by kernels.
    HostVisibleReadWrite,
    /// Host-allocated memory visible to the device, read by kernels.
    HostVisibleReadOnly,
}

impl BufferPlacement {
    /// True if the buffer storage is allocated in host-addressable memory.
    pub fn is_host_visible(self) -> bool {
        matches!(
            self,
            BufferPlacement::HostVisibleReadWrite | BufferPlacement::HostVisibleReadOnly
        )
    }
}

impl fmt::Display for BufferPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BufferPlacement::DeviceWriteOnly => "device write-only",
            BufferPlacement::DeviceReadOnly => "device read-only",
            BufferPlacement::HostVisibleReadWrite => "host-visible read-write",
            BufferPlacement::HostVisibleReadOnly => "host-visible read-only",
        };
        f.write_str(s)
    }
}

/// Capacity and placement chosen once per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyPlan {
    /// Number of `f32` elements in the weight and input vectors.
    pub size: usize,
    /// Memory model the plan was derived for.
    pub memory_model: MemoryModel,
    /// Placement of the persistent weight buffer.
    pub weights: BufferPlacement,
    /// Placement of the input buffer.
    pub input: BufferPlacement,
}

impl ResidencyPlan {
    /// Derive the plan from device capabilities.
    pub fn from_capabilities(caps: &DeviceCapabilities) -> Result<Self> {
        let mut size = (caps.max_alloc_bytes / 2 / std::mem::size_of::<f64>() as u64) as usize;

        let plan = match caps.memory_model() {
            MemoryModel::Unified => {
                size /= 2;
                Self {
                    size,
                    memory_model: MemoryModel::Unified,
                    weights: BufferPlacement::HostVisibleReadWrite,
                    input: BufferPlacement::HostVisibleReadOnly,
                }
            }
            MemoryModel::Discrete => Self {
                size,
                memory_model: MemoryModel::Discrete,
                weights: BufferPlacement::DeviceWriteOnly,
                input: BufferPlacement::DeviceReadOnly,
            },
        };

        if plan.size == 0 {
            return Err(StreamAvgError::AllocationFailure {
                requested: 0,
                reason: format!(
                    "max allocation of {} bytes leaves no room for a weight vector",
                    caps.max_alloc_bytes
                ),
            });
        }

        tracing::debug!(
            "Residency plan: {} elements, weights {}, input {}",
            plan.size,
            plan.weights,
            plan.input
        );

        Ok(plan)
    }

    /// Clamp the capacity to `limit` elements. Never grows the plan.
    pub fn clamped(mut self, limit: Option<usize>) -> Result<Self> {
        if let Some(limit) = limit {
            if limit == 0 {
                return Err(StreamAvgError::InvalidConfig(
                    "capacity_limit must be greater than zero".to_string(),
                ));
            }
            if limit < self.size {
                tracing::warn!(
                    "Clamping vector capacity from {} to {} elements",
                    self.size,
                    limit
                );
                self.size = limit;
            }
        }
        Ok(self)
    }

    /// Size of one vector in bytes.
    pub fn vector_bytes(&self) -> usize {
        self.size * std::mem::size_of::<f32>()
    }
}

impl fmt::Display for ResidencyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vector capacity: {} elements", self.size)?;
        writeln!(f, "Bytes per vector: {}", self.vector_bytes())?;
        writeln!(f, "Weight buffer: {}", self.weights)?;
        write!(f, "Input buffer: {}", self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(max_alloc_bytes: u64, unified: bool) -> DeviceCapabilities {
        DeviceCapabilities {
            platform_name: "p".to_string(),
            name: "d".to_string(),
            compute_units: 4,
            global_mem_bytes: max_alloc_bytes * 4,
            local_mem_bytes: 32 * 1024,
            max_alloc_bytes,
            unified_memory: unified,
        }
    }

    #[test]
    fn test_discrete_plan_uses_double_width_halving() {
        let plan = ResidencyPlan::from_capabilities(&caps(1024, false)).unwrap();
        assert_eq!(plan.size, 1024 / 2 / 8);
        assert_eq!(plan.weights, BufferPlacement::DeviceWriteOnly);
        assert_eq!(plan.input, BufferPlacement::DeviceReadOnly);
    }

    #[test]
    fn test_unified_plan_halves_again() {
        let plan = ResidencyPlan::from_capabilities(&caps(1024, true)).unwrap();
        assert_eq!(plan.size, 1024 / 2 / 8 / 2);
        assert!(plan.weights.is_host_visible());
        assert!(plan.input.is_host_visible());
        assert_eq!(plan.memory_model, MemoryModel::Unified);
    }

    #[test]
    fn test_tiny_device_is_an_allocation_failure() {
        let err = ResidencyPlan::from_capabilities(&caps(15, false)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Allocation);
    }

    #[test]
    fn test_clamp_never_grows() {
        let plan = ResidencyPlan::from_capabilities(&caps(1024, false)).unwrap();
        assert_eq!(plan.clamped(Some(10)).unwrap().size, 10);
        assert_eq!(plan.clamped(Some(1_000_000)).unwrap().size, 64);
        assert_eq!(plan.clamped(None).unwrap().size, 64);
        assert!(plan.clamped(Some(0)).is_err());
    }

    #[test]
    fn test_placement_access() {
        assert!(!BufferPlacement::DeviceWriteOnly.is_host_visible());
        assert!(!BufferPlacement::DeviceReadOnly.is_host_visible());
        assert!(BufferPlacement::HostVisibleReadWrite.is_host_visible());
    }
}
