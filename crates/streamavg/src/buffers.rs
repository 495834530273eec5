//! Persistent weight and input buffers.

use tracing::info;

use streamavg_core::backend::{ComputeBackend, DeviceBuffer};
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::residency::ResidencyPlan;

/// The weight vector and the input vector it is updated from.
///
/// Both are allocated once with the placements chosen by the residency plan.
/// The weight buffer is zero-filled on the device before it is handed out,
/// so no update can observe uninitialized memory.
pub struct VectorBuffers<Buf> {
    weights: Buf,
    input: Buf,
}

impl<Buf: DeviceBuffer> VectorBuffers<Buf> {
    /// Allocate both buffers and enqueue the zero-fill of the weights.
    pub fn allocate<B>(backend: &mut B, plan: &ResidencyPlan) -> Result<Self>
    where
        B: ComputeBackend<Buffer = Buf>,
    {
        if !backend.is_program_built() {
            return Err(StreamAvgError::NotInitialized(
                "program must be built before allocating buffers".to_string(),
            ));
        }

        let mut weights = backend.create_buffer(plan.size, plan.weights)?;
        let input = backend.create_buffer(plan.size, plan.input)?;
        backend.enqueue_fill_zero(&mut weights)?;

        info!(
            "Allocated weight ({}) and input ({}) buffers of {} elements ({} bytes each)",
            weights.placement(),
            input.placement(),
            plan.size,
            plan.vector_bytes()
        );

        Ok(Self { weights, input })
    }

    /// Copy `sample` into the input buffer and enqueue one update of the weights.
    ///
    /// The copy is blocking, so `sample` may be dropped as soon as this returns.
    pub fn dispatch_update<B>(&mut self, backend: &mut B, sample: &[f32], t: u32) -> Result<()>
    where
        B: ComputeBackend<Buffer = Buf>,
    {
        backend.write_buffer(&mut self.input, sample)?;
        backend.enqueue_update(&mut self.weights, &self.input, t)
    }

    /// Block until the queue drains and read the weight vector.
    pub fn read_weights<B>(&self, backend: &mut B) -> Result<Vec<f32>>
    where
        B: ComputeBackend<Buffer = Buf>,
    {
        backend.map_read(&self.weights)
    }

    /// Number of elements per buffer.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if the buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The weight buffer.
    pub fn weights(&self) -> &Buf {
        &self.weights
    }

    /// The input buffer.
    pub fn input(&self) -> &Buf {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamavg_core::kernels::RUNNING_AVERAGE_CL;
    use streamavg_core::residency::BufferPlacement;
    use streamavg_sim::{Fault, MemoryUsage, SimBackend, SimProfile};

    fn plan(size: usize) -> ResidencyPlan {
        let backend = SimBackend::new(SimProfile::Discrete).unwrap();
        ResidencyPlan::from_capabilities(backend.capabilities())
            .unwrap()
            .clamped(Some(size))
            .unwrap()
    }

    #[test]
    fn test_allocate_requires_program() {
        let mut backend = SimBackend::new(SimProfile::Discrete).unwrap();
        let err = VectorBuffers::allocate(&mut backend, &plan(8)).err().unwrap();
        assert!(matches!(err, StreamAvgError::NotInitialized(_)));
    }

    #[test]
    fn test_allocated_weights_are_zero() {
        let mut backend = SimBackend::new(SimProfile::Discrete).unwrap();
        backend.build_program(RUNNING_AVERAGE_CL, "").unwrap();

        let buffers = VectorBuffers::allocate(&mut backend, &plan(8)).unwrap();
        assert_eq!(buffers.len(), 8);
        assert_eq!(buffers.weights().placement(), BufferPlacement::DeviceWriteOnly);
        assert_eq!(buffers.input().placement(), BufferPlacement::DeviceReadOnly);
        assert_eq!(buffers.read_weights(&mut backend).unwrap(), vec![0.0; 8]);
        assert_eq!(backend.memory_usage().device_bytes, 64);
    }

    #[test]
    fn test_dispatch_update() {
        let mut backend = SimBackend::new(SimProfile::Discrete).unwrap();
        backend.build_program(RUNNING_AVERAGE_CL, "").unwrap();
        let mut buffers = VectorBuffers::allocate(&mut backend, &plan(2)).unwrap();

        buffers.dispatch_update(&mut backend, &[2.0, 4.0], 1).unwrap();
        buffers.dispatch_update(&mut backend, &[4.0, 8.0], 2).unwrap();
        assert_eq!(buffers.read_weights(&mut backend).unwrap(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_failed_allocation_releases_buffers() {
        let mut backend = SimBackend::new(SimProfile::Discrete).unwrap();
        backend.build_program(RUNNING_AVERAGE_CL, "").unwrap();
        backend.inject_fault(Fault::Dispatch);

        let err = VectorBuffers::allocate(&mut backend, &plan(8)).err().unwrap();
        assert!(matches!(err, StreamAvgError::DispatchFailure(_)));
        assert_eq!(backend.memory_usage(), MemoryUsage::default());
    }

    #[test]
    fn test_dropping_buffers_releases_memory() {
        let mut backend = SimBackend::new(SimProfile::Unified).unwrap();
        backend.build_program(RUNNING_AVERAGE_CL, "").unwrap();
        let plan = ResidencyPlan::from_capabilities(backend.capabilities())
            .unwrap()
            .clamped(Some(4))
            .unwrap();

        let buffers = VectorBuffers::allocate(&mut backend, &plan).unwrap();
        assert_eq!(backend.memory_usage().host_visible_bytes, 32);
        drop(buffers);
        assert_eq!(backend.memory_usage(), MemoryUsage::default());
    }
}
