//! Backend-agnostic device interface.
//!
//! A backend owns every device handle it creates (context, queue, program,
//! kernels, buffers) and releases them on drop. All methods take `&mut self`:
//! the engine assumes a single logical update stream, and exclusive borrows
//! keep concurrent enqueues out at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::DeviceCapabilities;
use crate::error::Result;
use crate::residency::BufferPlacement;

/// Kind of compute backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Host-simulated accelerator.
    #[default]
    Simulated,
    /// OpenCL device.
    OpenCl,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Simulated => write!(f, "simulated"),
            BackendKind::OpenCl => write!(f, "opencl"),
        }
    }
}

/// A float buffer allocated by a backend.
pub trait DeviceBuffer: Send {
    /// Number of `f32` elements.
    fn len(&self) -> usize;

    /// Check if the buffer holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Placement the buffer was created with.
    fn placement(&self) -> BufferPlacement;

    /// Size in bytes.
    fn size_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<f32>()
    }
}

/// Compute device driving the running-average kernels.
///
/// Commands are submitted to a strictly in-order queue. `enqueue_*` methods
/// may return before the device has executed the command; [`map_read`]
/// blocks until every previously enqueued command has completed.
///
/// [`map_read`]: ComputeBackend::map_read
pub trait ComputeBackend: Send {
    /// Buffer type allocated by this backend.
    type Buffer: DeviceBuffer;

    /// Backend kind.
    fn kind(&self) -> BackendKind;

    /// Capabilities of the selected device.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Compile `source` and extract the zero-fill and update kernels.
    ///
    /// On failure the build log is logged at error level and returned in
    /// [`StreamAvgError::CompilationFailure`](crate::error::StreamAvgError::CompilationFailure).
    fn build_program(&mut self, source: &str, options: &str) -> Result<()>;

    /// Whether [`build_program`](ComputeBackend::build_program) has succeeded.
    fn is_program_built(&self) -> bool;

    /// Allocate an uninitialized buffer of `len` floats.
    fn create_buffer(&mut self, len: usize, placement: BufferPlacement) -> Result<Self::Buffer>;

    /// Enqueue the zero-fill kernel over the full extent of `buffer`.
    fn enqueue_fill_zero(&mut self, buffer: &mut Self::Buffer) -> Result<()>;

    /// Copy `data` into `buffer`, returning once the host memory may be reused.
    fn write_buffer(&mut self, buffer: &mut Self::Buffer, data: &[f32]) -> Result<()>;

    /// Bind `(weights, input, t)` and enqueue one update over the full extent.
    ///
    /// Either every element is updated or, on error, none is.
    fn enqueue_update(
        &mut self,
        weights: &mut Self::Buffer,
        input: &Self::Buffer,
        t: u32,
    ) -> Result<()>;

    /// Block until the queue drains, then return the contents of `buffer`.
    fn map_read(&mut self, buffer: &Self::Buffer) -> Result<Vec<f32>>;
}
