//! Simulated device profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use streamavg_core::capability::DeviceCapabilities;

/// Name reported for the simulated platform.
pub const SIM_PLATFORM_NAME: &str = "streamavg Simulated Platform";

/// Capability profile of the simulated accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimProfile {
    /// Discrete GPU with dedicated memory.
    #[default]
    Discrete,
    /// Integrated GPU sharing memory with the host.
    Unified,
    /// No accelerator present.
    Absent,
}

impl SimProfile {
    /// Capabilities reported by this profile, or `None` if no device exists.
    pub fn capabilities(self) -> Option<DeviceCapabilities> {
        match self {
            SimProfile::Discrete => Some(DeviceCapabilities {
                platform_name: SIM_PLATFORM_NAME.to_string(),
                name: "Simulated Discrete GPU".to_string(),
                compute_units: 16,
                global_mem_bytes: 64 * 1024 * 1024,
                local_mem_bytes: 48 * 1024,
                max_alloc_bytes: 16 * 1024 * 1024,
                unified_memory: false,
            }),
            SimProfile::Unified => Some(DeviceCapabilities {
                platform_name: SIM_PLATFORM_NAME.to_string(),
                name: "Simulated Integrated GPU".to_string(),
                compute_units: 4,
                global_mem_bytes: 32 * 1024 * 1024,
                local_mem_bytes: 32 * 1024,
                max_alloc_bytes: 8 * 1024 * 1024,
                unified_memory: true,
            }),
            SimProfile::Absent => None,
        }
    }
}

impl fmt::Display for SimProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimProfile::Discrete => write!(f, "discrete"),
            SimProfile::Unified => write!(f, "unified"),
            SimProfile::Absent => write!(f, "absent"),
        }
    }
}

impl FromStr for SimProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discrete" => Ok(SimProfile::Discrete),
            "unified" => Ok(SimProfile::Unified),
            "absent" | "none" => Ok(SimProfile::Absent),
            other => Err(format!("unknown simulated profile '{}'", other)),
        }
    }
}
