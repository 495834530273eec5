//! # streamavg Core
//!
//! Core traits and types for the streamavg compute-offload engine, which keeps
//! a running average of a fixed-length float vector on an accelerator and
//! mirrors it on the host for validation.
//!
//! ## Core Abstractions
//!
//! - [`ComputeBackend`] - Device seam: program build, buffers, dispatch, readback
//! - [`DeviceCapabilities`] - Static properties reported by the prober
//! - [`ResidencyPlan`] - Buffer capacity and placement derived from capabilities
//! - [`HostReference`] - Sequential host implementation of the update
//! - [`ConsistencyReport`] - Host/device relative error and timing summary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod capability;
pub mod error;
pub mod host;
pub mod kernels;
pub mod report;
pub mod residency;
pub mod timing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{BackendKind, ComputeBackend, DeviceBuffer};
    pub use crate::capability::{DeviceCapabilities, MemoryModel};
    pub use crate::error::{ErrorKind, Result, StreamAvgError};
    pub use crate::host::HostReference;
    pub use crate::kernels::{FILL_ZERO_KERNEL, RUNNING_AVERAGE_CL, UPDATE_KERNEL};
    pub use crate::report::{ConsistencyReport, ErrorNorms};
    pub use crate::residency::{BufferPlacement, ResidencyPlan};
    pub use crate::timing::TimingAccumulators;
}

// Re-exports for convenience
pub use backend::{BackendKind, ComputeBackend, DeviceBuffer};
pub use capability::{DeviceCapabilities, MemoryModel};
pub use error::{ErrorKind, Result, StreamAvgError};
pub use host::HostReference;
pub use report::{ConsistencyReport, ErrorNorms};
pub use residency::{BufferPlacement, ResidencyPlan};
pub use timing::TimingAccumulators;
