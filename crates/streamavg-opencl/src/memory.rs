//! OpenCL buffers.

use std::ptr;

use opencl3::context::Context;
use opencl3::memory::{
    Buffer, CL_MEM_ALLOC_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY,
};
use opencl3::types::{cl_float, cl_mem_flags};

use streamavg_core::backend::DeviceBuffer;
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::residency::BufferPlacement;

use crate::status::status_mnemonic;

/// Allocation flags for a placement.
pub(crate) fn mem_flags(placement: BufferPlacement) -> cl_mem_flags {
    match placement {
        BufferPlacement::DeviceWriteOnly => CL_MEM_WRITE_ONLY,
        BufferPlacement::DeviceReadOnly => CL_MEM_READ_ONLY,
        BufferPlacement::HostVisibleReadWrite => CL_MEM_READ_WRITE | CL_MEM_ALLOC_HOST_PTR,
        BufferPlacement::HostVisibleReadOnly => CL_MEM_READ_ONLY | CL_MEM_ALLOC_HOST_PTR,
    }
}

/// Float buffer in device or host-visible memory. Released on drop.
pub struct ClBuffer {
    buffer: Buffer<cl_float>,
    len: usize,
    placement: BufferPlacement,
}

impl ClBuffer {
    pub(crate) fn allocate(
        context: &Context,
        len: usize,
        placement: BufferPlacement,
    ) -> Result<Self> {
        let bytes = len * std::mem::size_of::<cl_float>();
        // SAFETY: no host pointer is passed, so the runtime owns the storage.
        let created = unsafe {
            Buffer::<cl_float>::create(context, mem_flags(placement), len, ptr::null_mut())
        };

        let buffer = cl_check!(created, "clCreateBuffer", |code, what| {
            StreamAvgError::AllocationFailure {
                requested: bytes,
                reason: format!("{}: {}", what, status_mnemonic(code)),
            }
        });

        Ok(Self {
            buffer,
            len,
            placement,
        })
    }

    pub(crate) fn raw(&self) -> &Buffer<cl_float> {
        &self.buffer
    }

    pub(crate) fn raw_mut(&mut self) -> &mut Buffer<cl_float> {
        &mut self.buffer
    }
}

impl DeviceBuffer for ClBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn placement(&self) -> BufferPlacement {
        self.placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_flags() {
        assert_eq!(mem_flags(BufferPlacement::DeviceWriteOnly), CL_MEM_WRITE_ONLY);
        assert_eq!(mem_flags(BufferPlacement::DeviceReadOnly), CL_MEM_READ_ONLY);
        assert_ne!(
            mem_flags(BufferPlacement::HostVisibleReadWrite) & CL_MEM_ALLOC_HOST_PTR,
            0
        );
        assert_ne!(
            mem_flags(BufferPlacement::HostVisibleReadOnly) & CL_MEM_READ_ONLY,
            0
        );
    }
}
