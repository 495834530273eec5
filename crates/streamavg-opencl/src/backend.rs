//! OpenCL implementation of [`ComputeBackend`].

use std::ffi::c_void;
use std::ptr;

use opencl3::memory::{ClMem, CL_MAP_READ};
use opencl3::types::{cl_float, cl_mem, cl_uint, CL_BLOCKING};
use tracing::{debug, trace};

use streamavg_core::backend::{BackendKind, ComputeBackend, DeviceBuffer};
use streamavg_core::capability::DeviceCapabilities;
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::kernels::{ARG_INPUT, ARG_ITERATION, ARG_WEIGHTS};
use streamavg_core::residency::BufferPlacement;

use crate::context::{Kernels, OpenClContext};
use crate::device::probe_device;
use crate::memory::ClBuffer;
use crate::status::{dispatch_error, map_error};

/// Backend driving the first GPU of the first OpenCL platform.
pub struct OpenClBackend {
    capabilities: DeviceCapabilities,
    context: OpenClContext,
}

impl OpenClBackend {
    /// Select the device, query its capabilities and create a context and
    /// profiling queue for it.
    pub fn probe() -> Result<Self> {
        let (device, capabilities) = probe_device()?;
        let context = OpenClContext::new(device)?;
        Ok(Self {
            capabilities,
            context,
        })
    }

    fn kernels(&self) -> Result<&Kernels> {
        self.context.kernels().ok_or_else(|| {
            StreamAvgError::NotInitialized("program has not been built".to_string())
        })
    }
}

impl ComputeBackend for OpenClBackend {
    type Buffer = ClBuffer;

    fn kind(&self) -> BackendKind {
        BackendKind::OpenCl
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn build_program(&mut self, source: &str, options: &str) -> Result<()> {
        debug!("Building OpenCL program (options: '{}')", options);
        self.context.build(source, options)
    }

    fn is_program_built(&self) -> bool {
        self.context.kernels().is_some()
    }

    fn create_buffer(&mut self, len: usize, placement: BufferPlacement) -> Result<ClBuffer> {
        if len == 0 {
            return Err(StreamAvgError::AllocationFailure {
                requested: 0,
                reason: "zero-sized buffer".to_string(),
            });
        }
        let buffer = ClBuffer::allocate(self.context.context(), len, placement)?;
        debug!("Allocated {} bytes ({})", buffer.size_bytes(), placement);
        Ok(buffer)
    }

    fn enqueue_fill_zero(&mut self, buffer: &mut ClBuffer) -> Result<()> {
        let kernel = &self.kernels()?.fill_zero;
        let global = [buffer.len()];

        // SAFETY: the argument is a live buffer matching `__global float*`,
        // and the global size equals its element count.
        let _event = unsafe {
            cl_check!(
                kernel.set_arg(ARG_WEIGHTS, &buffer.raw().get()),
                "clSetKernelArg(fillZero, w)",
                dispatch_error
            );
            cl_check!(
                self.context.queue().enqueue_nd_range_kernel(
                    kernel.get(),
                    1,
                    ptr::null(),
                    global.as_ptr(),
                    ptr::null(),
                    &[],
                ),
                "clEnqueueNDRangeKernel(fillZero)",
                dispatch_error
            )
        };
        trace!("enqueue fillZero over {} elements", buffer.len());
        Ok(())
    }

    fn write_buffer(&mut self, buffer: &mut ClBuffer, data: &[f32]) -> Result<()> {
        if data.len() != buffer.len() {
            return Err(StreamAvgError::InvalidSample {
                expected: buffer.len(),
                actual: data.len(),
            });
        }

        // SAFETY: the write is blocking, so `data` outlives the transfer.
        let _event = unsafe {
            cl_check!(
                self.context.queue().enqueue_write_buffer(
                    buffer.raw_mut(),
                    CL_BLOCKING,
                    0,
                    data,
                    &[],
                ),
                "clEnqueueWriteBuffer",
                dispatch_error
            )
        };
        Ok(())
    }

    fn enqueue_update(
        &mut self,
        weights: &mut ClBuffer,
        input: &ClBuffer,
        t: u32,
    ) -> Result<()> {
        if weights.len() != input.len() {
            return Err(StreamAvgError::DispatchFailure(format!(
                "weight buffer has {} elements, input buffer {}",
                weights.len(),
                input.len()
            )));
        }
        if t == 0 {
            return Err(StreamAvgError::DispatchFailure(
                "iteration count must be at least 1".to_string(),
            ));
        }

        let kernel = &self.kernels()?.update;
        let global = [weights.len()];
        let t: cl_uint = t;

        // SAFETY: argument types match `(__global float*, __global const
        // float*, const uint)` and the global size equals both extents.
        let _event = unsafe {
            cl_check!(
                kernel.set_arg(ARG_WEIGHTS, &weights.raw().get()),
                "clSetKernelArg(UpdateWeights, w)",
                dispatch_error
            );
            cl_check!(
                kernel.set_arg(ARG_INPUT, &input.raw().get()),
                "clSetKernelArg(UpdateWeights, x)",
                dispatch_error
            );
            cl_check!(
                kernel.set_arg(ARG_ITERATION, &t),
                "clSetKernelArg(UpdateWeights, t)",
                dispatch_error
            );
            cl_check!(
                self.context.queue().enqueue_nd_range_kernel(
                    kernel.get(),
                    1,
                    ptr::null(),
                    global.as_ptr(),
                    ptr::null(),
                    &[],
                ),
                "clEnqueueNDRangeKernel(UpdateWeights)",
                dispatch_error
            )
        };
        trace!("enqueue UpdateWeights (t = {})", t);
        Ok(())
    }

    fn map_read(&mut self, buffer: &ClBuffer) -> Result<Vec<f32>> {
        let queue = self.context.queue();
        let bytes = buffer.size_bytes();
        let mut mapped: cl_mem = ptr::null_mut();

        // SAFETY: the map is blocking and covers exactly `len` floats, which
        // are copied out before the region is unmapped.
        let data = unsafe {
            let _map_event = cl_check!(
                queue.enqueue_map_buffer(
                    buffer.raw(),
                    CL_BLOCKING,
                    CL_MAP_READ,
                    0,
                    bytes,
                    &mut mapped,
                    &[],
                ),
                "clEnqueueMapBuffer",
                map_error
            );
            let data =
                std::slice::from_raw_parts(mapped as *const cl_float, buffer.len()).to_vec();

            let unmap_event = cl_check!(
                queue.enqueue_unmap_mem_object(buffer.raw().get(), mapped as *mut c_void, &[]),
                "clEnqueueUnmapMemObject",
                map_error
            );
            cl_check!(unmap_event.wait(), "clWaitForEvents", map_error);
            data
        };

        Ok(data)
    }
}
