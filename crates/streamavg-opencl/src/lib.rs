//! OpenCL backend for streamavg.
//!
//! Drives the running-average kernels on the first GPU of the first OpenCL
//! platform through `opencl3`.
//!
//! # Features
//!
//! - `opencl` - Link against the OpenCL ICD loader. Without it
//!   [`OpenClBackend::probe`] always reports the device as unavailable.
//!
//! # Example
//!
//! ```ignore
//! use streamavg_core::prelude::*;
//! use streamavg_opencl::OpenClBackend;
//!
//! let mut backend = OpenClBackend::probe()?;
//! backend.build_program(RUNNING_AVERAGE_CL, "")?;
//! println!("{}", backend.capabilities());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[macro_use]
pub mod status;

#[cfg(feature = "opencl")]
mod backend;
#[cfg(feature = "opencl")]
mod context;
#[cfg(feature = "opencl")]
mod device;
#[cfg(feature = "opencl")]
mod memory;

#[cfg(feature = "opencl")]
pub use backend::OpenClBackend;
#[cfg(feature = "opencl")]
pub use memory::ClBuffer;

// Placeholder implementation when OpenCL is not available
#[cfg(not(feature = "opencl"))]
mod stub {
    use std::convert::Infallible;

    use streamavg_core::backend::{BackendKind, ComputeBackend, DeviceBuffer};
    use streamavg_core::capability::DeviceCapabilities;
    use streamavg_core::error::{Result, StreamAvgError};
    use streamavg_core::residency::BufferPlacement;

    /// Stub buffer; never constructed.
    pub enum ClBuffer {}

    impl DeviceBuffer for ClBuffer {
        fn len(&self) -> usize {
            match *self {}
        }

        fn placement(&self) -> BufferPlacement {
            match *self {}
        }
    }

    /// Stub OpenCL backend when the `opencl` feature is disabled.
    pub struct OpenClBackend {
        never: Infallible,
    }

    impl OpenClBackend {
        /// Probing fails when OpenCL is not available.
        pub fn probe() -> Result<Self> {
            Err(StreamAvgError::DeviceUnavailable(
                "OpenCL feature not enabled".to_string(),
            ))
        }
    }

    impl ComputeBackend for OpenClBackend {
        type Buffer = ClBuffer;

        fn kind(&self) -> BackendKind {
            BackendKind::OpenCl
        }

        fn capabilities(&self) -> &DeviceCapabilities {
            match self.never {}
        }

        fn build_program(&mut self, _source: &str, _options: &str) -> Result<()> {
            match self.never {}
        }

        fn is_program_built(&self) -> bool {
            false
        }

        fn create_buffer(&mut self, _len: usize, _placement: BufferPlacement) -> Result<ClBuffer> {
            match self.never {}
        }

        fn enqueue_fill_zero(&mut self, buffer: &mut ClBuffer) -> Result<()> {
            match *buffer {}
        }

        fn write_buffer(&mut self, buffer: &mut ClBuffer, _data: &[f32]) -> Result<()> {
            match *buffer {}
        }

        fn enqueue_update(
            &mut self,
            weights: &mut ClBuffer,
            _input: &ClBuffer,
            _t: u32,
        ) -> Result<()> {
            match *weights {}
        }

        fn map_read(&mut self, buffer: &ClBuffer) -> Result<Vec<f32>> {
            match *buffer {}
        }
    }
}

#[cfg(not(feature = "opencl"))]
pub use stub::{ClBuffer, OpenClBackend};

/// Check if an OpenCL GPU is available at runtime.
///
/// Returns false if the `opencl` feature is disabled, no ICD loader or
/// platform is installed, or the first platform exposes no GPU.
pub fn is_opencl_available() -> bool {
    #[cfg(feature = "opencl")]
    {
        device::probe_device().is_ok()
    }
    #[cfg(not(feature = "opencl"))]
    {
        false
    }
}

#[cfg(all(test, not(feature = "opencl")))]
mod tests {
    use super::*;

    #[test]
    fn test_stub_reports_unavailable() {
        assert!(!is_opencl_available());
        let err = OpenClBackend::probe().err().map(|e| e.is_device_unavailable());
        assert_eq!(err, Some(true));
    }
}
