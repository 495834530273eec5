//! OpenCL status codes.
//!
//! Maps raw `cl_int` statuses to their mnemonics (e.g. `CL_DEVICE_NOT_FOUND`
//! instead of `-1`) and to [`StreamAvgError`] kinds. Every OpenCL call goes
//! through `cl_check!`, which logs the mnemonic with the file and line of the
//! failing call before returning the converted error.

use streamavg_core::error::StreamAvgError;

/// `CL_SUCCESS`.
pub const CL_SUCCESS: i32 = 0;
/// `CL_DEVICE_NOT_FOUND`.
pub const CL_DEVICE_NOT_FOUND: i32 = -1;
/// `CL_DEVICE_NOT_AVAILABLE`.
pub const CL_DEVICE_NOT_AVAILABLE: i32 = -2;
/// `CL_MEM_OBJECT_ALLOCATION_FAILURE`.
pub const CL_MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
/// `CL_OUT_OF_RESOURCES`.
pub const CL_OUT_OF_RESOURCES: i32 = -5;
/// `CL_OUT_OF_HOST_MEMORY`.
pub const CL_OUT_OF_HOST_MEMORY: i32 = -6;
/// `CL_BUILD_PROGRAM_FAILURE`.
pub const CL_BUILD_PROGRAM_FAILURE: i32 = -11;
/// `CL_MAP_FAILURE`.
pub const CL_MAP_FAILURE: i32 = -12;
/// `CL_INVALID_KERNEL_NAME`.
pub const CL_INVALID_KERNEL_NAME: i32 = -46;
/// `CL_PLATFORM_NOT_FOUND_KHR`, returned by the ICD loader without platforms.
pub const CL_PLATFORM_NOT_FOUND_KHR: i32 = -1001;

/// Mnemonic for an OpenCL status code.
pub fn status_mnemonic(code: i32) -> &'static str {
    match code {
        0 => "CL_SUCCESS",
        -1 => "CL_DEVICE_NOT_FOUND",
        -2 => "CL_DEVICE_NOT_AVAILABLE",
        -3 => "CL_COMPILER_NOT_AVAILABLE",
        -4 => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        -5 => "CL_OUT_OF_RESOURCES",
        -6 => "CL_OUT_OF_HOST_MEMORY",
        -7 => "CL_PROFILING_INFO_NOT_AVAILABLE",
        -8 => "CL_MEM_COPY_OVERLAP",
        -9 => "CL_IMAGE_FORMAT_MISMATCH",
        -10 => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
        -11 => "CL_BUILD_PROGRAM_FAILURE",
        -12 => "CL_MAP_FAILURE",
        -13 => "CL_MISALIGNED_SUB_BUFFER_OFFSET",
        -14 => "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST",
        -15 => "CL_COMPILE_PROGRAM_FAILURE",
        -16 => "CL_LINKER_NOT_AVAILABLE",
        -17 => "CL_LINK_PROGRAM_FAILURE",
        -18 => "CL_DEVICE_PARTITION_FAILED",
        -19 => "CL_KERNEL_ARG_INFO_NOT_AVAILABLE",
        -30 => "CL_INVALID_VALUE",
        -31 => "CL_INVALID_DEVICE_TYPE",
        -32 => "CL_INVALID_PLATFORM",
        -33 => "CL_INVALID_DEVICE",
        -34 => "CL_INVALID_CONTEXT",
        -35 => "CL_INVALID_QUEUE_PROPERTIES",
        -36 => "CL_INVALID_COMMAND_QUEUE",
        -37 => "CL_INVALID_HOST_PTR",
        -38 => "CL_INVALID_MEM_OBJECT",
        -39 => "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR",
        -40 => "CL_INVALID_IMAGE_SIZE",
        -41 => "CL_INVALID_SAMPLER",
        -42 => "CL_INVALID_BINARY",
        -43 => "CL_INVALID_BUILD_OPTIONS",
        -44 => "CL_INVALID_PROGRAM",
        -45 => "CL_INVALID_PROGRAM_EXECUTABLE",
        -46 => "CL_INVALID_KERNEL_NAME",
        -47 => "CL_INVALID_KERNEL_DEFINITION",
        -48 => "CL_INVALID_KERNEL",
        -49 => "CL_INVALID_ARG_INDEX",
        -50 => "CL_INVALID_ARG_VALUE",
        -51 => "CL_INVALID_ARG_SIZE",
        -52 => "CL_INVALID_KERNEL_ARGS",
        -53 => "CL_INVALID_WORK_DIMENSION",
        -54 => "CL_INVALID_WORK_GROUP_SIZE",
        -55 => "CL_INVALID_WORK_ITEM_SIZE",
        -56 => "CL_INVALID_GLOBAL_OFFSET",
        -57 => "CL_INVALID_EVENT_WAIT_LIST",
        -58 => "CL_INVALID_EVENT",
        -59 => "CL_INVALID_OPERATION",
        -60 => "CL_INVALID_GL_OBJECT",
        -61 => "CL_INVALID_BUFFER_SIZE",
        -62 => "CL_INVALID_MIP_LEVEL",
        -63 => "CL_INVALID_GLOBAL_WORK_SIZE",
        -64 => "CL_INVALID_PROPERTY",
        -65 => "CL_INVALID_IMAGE_DESCRIPTOR",
        -66 => "CL_INVALID_COMPILER_OPTIONS",
        -67 => "CL_INVALID_LINKER_OPTIONS",
        -68 => "CL_INVALID_DEVICE_PARTITION_COUNT",
        -1001 => "CL_PLATFORM_NOT_FOUND_KHR",
        _ => "UNKNOWN ERROR CODE",
    }
}

/// Generic device-API failure.
pub fn backend_error(code: i32, context: &str) -> StreamAvgError {
    StreamAvgError::Backend {
        code,
        mnemonic: status_mnemonic(code),
        context: context.to_string(),
    }
}

/// Failure while locating a device or creating its context.
pub fn device_error(code: i32, context: &str) -> StreamAvgError {
    match code {
        CL_DEVICE_NOT_FOUND | CL_DEVICE_NOT_AVAILABLE | CL_PLATFORM_NOT_FOUND_KHR => {
            StreamAvgError::DeviceUnavailable(format!("{}: {}", context, status_mnemonic(code)))
        }
        _ => allocation_error(code, context),
    }
}

/// Failure while creating a context, queue or buffer.
pub fn allocation_error(code: i32, context: &str) -> StreamAvgError {
    StreamAvgError::AllocationFailure {
        requested: 0,
        reason: format!("{}: {}", context, status_mnemonic(code)),
    }
}

/// Failure while creating `kernel` from a built program.
///
/// A program that builds but does not define `kernel` is reported like a
/// failed build; resource exhaustion stays an allocation failure.
pub fn kernel_error(code: i32, context: &str, kernel: &str) -> StreamAvgError {
    match code {
        CL_OUT_OF_RESOURCES | CL_OUT_OF_HOST_MEMORY => allocation_error(code, context),
        _ => StreamAvgError::CompilationFailure {
            kernel_log: format!(
                "error: kernel '{}' could not be created ({}: {})",
                kernel,
                context,
                status_mnemonic(code)
            ),
        },
    }
}

/// Failure while binding arguments or enqueueing a kernel.
pub fn dispatch_error(code: i32, context: &str) -> StreamAvgError {
    StreamAvgError::DispatchFailure(format!("{}: {}", context, status_mnemonic(code)))
}

/// Failure while mapping a buffer for readback.
pub fn map_error(code: i32, context: &str) -> StreamAvgError {
    StreamAvgError::MapFailure(format!("{}: {}", context, status_mnemonic(code)))
}

/// Check the result of an OpenCL call.
///
/// On error, logs the status mnemonic with the source location and returns
/// from the enclosing function with the error built by `$into`
/// (default: [`backend_error`]).
#[cfg(feature = "opencl")]
macro_rules! cl_check {
    ($call:expr, $what:expr) => {
        cl_check!($call, $what, $crate::status::backend_error)
    };
    ($call:expr, $what:expr, $into:expr) => {
        match $call {
            Ok(value) => value,
            Err(err) => {
                let code: i32 = err.0;
                ::tracing::error!(
                    "OpenCL error with code {} happened in file {} at line {} ({})",
                    $crate::status::status_mnemonic(code),
                    file!(),
                    line!(),
                    $what
                );
                return Err(($into)(code, $what));
            }
        }
    };
}
