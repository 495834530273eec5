//! Context, queue and program ownership.

use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::kernel::Kernel;
use opencl3::program::Program;
use tracing::{debug, error, info};

use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::kernels::{FILL_ZERO_KERNEL, UPDATE_KERNEL};

use crate::status::{allocation_error, kernel_error, status_mnemonic};

/// Compiled kernels of the running-average program.
pub(crate) struct Kernels {
    pub(crate) fill_zero: Kernel,
    pub(crate) update: Kernel,
    // Released after both kernels.
    _program: Program,
}

/// Device context with its in-order profiling queue.
///
/// Fields drop in declaration order: kernels and program first, then the
/// queue, then the context.
pub(crate) struct OpenClContext {
    kernels: Option<Kernels>,
    queue: CommandQueue,
    context: Context,
    device: Device,
}

impl OpenClContext {
    /// Create a context and command queue for `device`.
    pub(crate) fn new(device: Device) -> Result<Self> {
        let context = cl_check!(Context::from_device(&device), "clCreateContext", allocation_error);

        #[allow(deprecated)]
        let queue = cl_check!(
            CommandQueue::create_default(&context, CL_QUEUE_PROFILING_ENABLE),
            "clCreateCommandQueue",
            allocation_error
        );
        debug!("Created context and in-order profiling queue");

        Ok(Self {
            kernels: None,
            queue,
            context,
            device,
        })
    }

    /// Compile `source` and create both kernels, replacing any earlier build.
    pub(crate) fn build(&mut self, source: &str, options: &str) -> Result<()> {
        let mut program = cl_check!(
            Program::create_from_source(&self.context, source),
            "clCreateProgramWithSource"
        );

        if let Err(err) = program.build(self.context.devices(), options) {
            let kernel_log = program
                .get_build_log(self.device.id())
                .unwrap_or_else(|e| format!("build log unavailable: {}", e));
            error!(
                "Error happened during the build of the program ({}).\nBuild log:\n{}",
                status_mnemonic(err.0),
                kernel_log
            );
            return Err(StreamAvgError::CompilationFailure { kernel_log });
        }

        let fill_zero = cl_check!(
            Kernel::create(&program, FILL_ZERO_KERNEL),
            "clCreateKernel",
            |code, what| kernel_error(code, what, FILL_ZERO_KERNEL)
        );
        let update = cl_check!(
            Kernel::create(&program, UPDATE_KERNEL),
            "clCreateKernel",
            |code, what| kernel_error(code, what, UPDATE_KERNEL)
        );
        info!(
            "Built program with kernels '{}' and '{}'",
            FILL_ZERO_KERNEL, UPDATE_KERNEL
        );

        self.kernels = Some(Kernels {
            fill_zero,
            update,
            _program: program,
        });
        Ok(())
    }

    pub(crate) fn kernels(&self) -> Option<&Kernels> {
        self.kernels.as_ref()
    }

    pub(crate) fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }
}
