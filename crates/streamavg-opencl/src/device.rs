//! Device discovery and capability queries.

use opencl3::device::{Device, CL_DEVICE_TYPE_GPU};
use opencl3::platform::get_platforms;
use tracing::{debug, info};

use streamavg_core::capability::DeviceCapabilities;
use streamavg_core::error::{Result, StreamAvgError};

use crate::status::device_error;

/// Select the first GPU of the first platform and query its capabilities.
pub(crate) fn probe_device() -> Result<(Device, DeviceCapabilities)> {
    let platforms = cl_check!(get_platforms(), "clGetPlatformIDs", device_error);
    let platform = platforms.first().ok_or_else(|| {
        StreamAvgError::DeviceUnavailable("no OpenCL platform installed".to_string())
    })?;
    let platform_name = cl_check!(platform.name(), "clGetPlatformInfo");

    let device_ids = cl_check!(
        platform.get_devices(CL_DEVICE_TYPE_GPU),
        "clGetDeviceIDs",
        device_error
    );
    let device_id = *device_ids.first().ok_or_else(|| {
        StreamAvgError::DeviceUnavailable(format!("no GPU device on platform '{}'", platform_name))
    })?;
    let device = Device::new(device_id);

    let capabilities = query_capabilities(&device, platform_name)?;
    info!(
        "Selected OpenCL device '{}' on platform '{}'",
        capabilities.name, capabilities.platform_name
    );
    Ok((device, capabilities))
}

fn query_capabilities(device: &Device, platform_name: String) -> Result<DeviceCapabilities> {
    let name = cl_check!(device.name(), "CL_DEVICE_NAME");
    let compute_units = cl_check!(device.max_compute_units(), "CL_DEVICE_MAX_COMPUTE_UNITS");
    let global_mem_bytes = cl_check!(device.global_mem_size(), "CL_DEVICE_GLOBAL_MEM_SIZE");
    let local_mem_bytes = cl_check!(device.local_mem_size(), "CL_DEVICE_LOCAL_MEM_SIZE");
    let max_alloc_bytes = cl_check!(device.max_mem_alloc_size(), "CL_DEVICE_MAX_MEM_ALLOC_SIZE");
    let unified_memory = cl_check!(device.host_unified_memory(), "CL_DEVICE_HOST_UNIFIED_MEMORY");

    debug!("Platform: {}", platform_name);
    debug!("Device: {}", name);
    debug!("Compute units: {}", compute_units);
    debug!("Global memory: {} bytes", global_mem_bytes);
    debug!("Local memory: {} bytes", local_mem_bytes);
    debug!("Max allocation: {} bytes", max_alloc_bytes);
    debug!("Unified memory: {}", unified_memory);

    Ok(DeviceCapabilities {
        platform_name,
        name,
        compute_units,
        global_mem_bytes,
        local_mem_bytes,
        max_alloc_bytes,
        unified_memory,
    })
}
