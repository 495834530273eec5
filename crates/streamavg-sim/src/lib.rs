//! Simulated accelerator backend for streamavg.
//!
//! Runs the zero-fill and update kernels on the host thread pool behind the
//! same [`ComputeBackend`](streamavg_core::ComputeBackend) interface as the
//! OpenCL backend. Capability profiles cover discrete, unified and absent
//! devices, so both residency strategies and the device-unavailable path can
//! be exercised without hardware.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod device;
mod memory;
mod program;
mod queue;
mod runtime;

pub use device::{SimProfile, SIM_PLATFORM_NAME};
pub use memory::{MemoryTracker, MemoryUsage, SimBuffer};
pub use program::{KernelSignature, SimProgram};
pub use queue::QueueStats;
pub use runtime::{Fault, SimBackend};
