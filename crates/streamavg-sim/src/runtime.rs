//! Simulated backend implementation.

use std::sync::Arc;

use tracing::{debug, error, info};

use streamavg_core::backend::{BackendKind, ComputeBackend, DeviceBuffer};
use streamavg_core::capability::DeviceCapabilities;
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::kernels::{FILL_ZERO_KERNEL, UPDATE_KERNEL};
use streamavg_core::residency::BufferPlacement;

use crate::device::SimProfile;
use crate::memory::{MemoryCounters, MemoryTracker, MemoryUsage, SimBuffer};
use crate::program::SimProgram;
use crate::queue::{aliases, Command, CommandQueue, QueueStats};

/// One-shot failure injected into the next matching operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Next program build fails.
    Compilation,
    /// Next buffer allocation fails.
    Allocation,
    /// Next kernel enqueue fails.
    Dispatch,
    /// Next blocking readback fails.
    Map,
}

/// Accelerator simulated on the host.
///
/// Behaves like an in-order device queue: kernels are deferred until a
/// blocking write or readback drains the queue. Used for testing and as a
/// fallback when no OpenCL device is available.
pub struct SimBackend {
    capabilities: DeviceCapabilities,
    program: Option<SimProgram>,
    queue: CommandQueue,
    counters: Arc<MemoryCounters>,
    next_buffer_id: u64,
    fault: Option<Fault>,
}

impl SimBackend {
    /// Create a backend for one of the built-in profiles.
    pub fn new(profile: SimProfile) -> Result<Self> {
        let capabilities = profile.capabilities().ok_or_else(|| {
            StreamAvgError::DeviceUnavailable(format!(
                "simulated profile '{}' exposes no accelerator",
                profile
            ))
        })?;
        Ok(Self::with_capabilities(capabilities))
    }

    /// Create a backend reporting arbitrary capabilities.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        info!(
            "Initializing simulated device '{}' ({} compute units, {} memory)",
            capabilities.name,
            capabilities.compute_units,
            capabilities.memory_model()
        );

        Self {
            capabilities,
            program: None,
            queue: CommandQueue::default(),
            counters: Arc::new(MemoryCounters::default()),
            next_buffer_id: 1,
            fault: None,
        }
    }

    /// Make the next operation of the given kind fail.
    pub fn inject_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// Queue activity counters.
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Memory currently allocated.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.counters.snapshot()
    }

    /// Tracker that keeps reporting after this backend is dropped.
    pub fn memory_tracker(&self) -> MemoryTracker {
        MemoryTracker::new(Arc::clone(&self.counters))
    }

    fn take_fault(&mut self, fault: Fault) -> bool {
        if self.fault == Some(fault) {
            self.fault = None;
            true
        } else {
            false
        }
    }

    fn require_program(&self, kernel: &str) -> Result<()> {
        match &self.program {
            Some(program) if program.kernel(kernel).is_some() => Ok(()),
            Some(_) => Err(StreamAvgError::DispatchFailure(format!(
                "kernel '{}' not found in program",
                kernel
            ))),
            None => Err(StreamAvgError::NotInitialized(
                "program has not been built".to_string(),
            )),
        }
    }
}

impl ComputeBackend for SimBackend {
    type Buffer = SimBuffer;

    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn build_program(&mut self, source: &str, options: &str) -> Result<()> {
        debug!("Building simulated program (options: '{}')", options);

        let built = if self.take_fault(Fault::Compilation) {
            Err(StreamAvgError::CompilationFailure {
                kernel_log: "error: injected compiler failure".to_string(),
            })
        } else {
            SimProgram::build(source)
        };

        match built {
            Ok(program) => {
                info!(
                    "Built program with kernels '{}' and '{}'",
                    FILL_ZERO_KERNEL, UPDATE_KERNEL
                );
                self.program = Some(program);
                Ok(())
            }
            Err(e) => {
                if let StreamAvgError::CompilationFailure { kernel_log } = &e {
                    error!(
                        "Error happened during the build of the program.\nBuild log:\n{}",
                        kernel_log
                    );
                }
                Err(e)
            }
        }
    }

    fn is_program_built(&self) -> bool {
        self.program.is_some()
    }

    fn create_buffer(&mut self, len: usize, placement: BufferPlacement) -> Result<SimBuffer> {
        let bytes = len * std::mem::size_of::<f32>();

        if self.take_fault(Fault::Allocation) {
            return Err(StreamAvgError::AllocationFailure {
                requested: bytes,
                reason: "injected allocation failure".to_string(),
            });
        }
        if len == 0 {
            return Err(StreamAvgError::AllocationFailure {
                requested: 0,
                reason: "zero-sized buffer".to_string(),
            });
        }
        if bytes as u64 > self.capabilities.max_alloc_bytes {
            return Err(StreamAvgError::AllocationFailure {
                requested: bytes,
                reason: format!(
                    "exceeds max allocation of {} bytes",
                    self.capabilities.max_alloc_bytes
                ),
            });
        }
        let in_use = self.counters.total() as u64;
        if in_use + bytes as u64 > self.capabilities.global_mem_bytes {
            return Err(StreamAvgError::AllocationFailure {
                requested: bytes,
                reason: format!(
                    "out of device memory ({} of {} bytes in use)",
                    in_use, self.capabilities.global_mem_bytes
                ),
            });
        }

        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        debug!("Allocated buffer #{} ({} bytes, {})", id, bytes, placement);

        Ok(SimBuffer::new(id, len, placement, Arc::clone(&self.counters)))
    }

    fn enqueue_fill_zero(&mut self, buffer: &mut SimBuffer) -> Result<()> {
        self.require_program(FILL_ZERO_KERNEL)?;
        if self.take_fault(Fault::Dispatch) {
            return Err(StreamAvgError::DispatchFailure(
                "injected enqueue failure".to_string(),
            ));
        }

        self.queue.enqueue(Command::FillZero {
            weights: Arc::clone(buffer.storage()),
        });
        Ok(())
    }

    fn write_buffer(&mut self, buffer: &mut SimBuffer, data: &[f32]) -> Result<()> {
        if data.len() != buffer.len() {
            return Err(StreamAvgError::InvalidSample {
                expected: buffer.len(),
                actual: data.len(),
            });
        }

        // Blocking write: completes after everything queued before it.
        self.queue.enqueue(Command::Write {
            dst: Arc::clone(buffer.storage()),
            data: data.to_vec(),
        });
        self.queue.finish();
        Ok(())
    }

    fn enqueue_update(
        &mut self,
        weights: &mut SimBuffer,
        input: &SimBuffer,
        t: u32,
    ) -> Result<()> {
        self.require_program(UPDATE_KERNEL)?;

        if weights.len() != input.len() {
            return Err(StreamAvgError::DispatchFailure(format!(
                "weight buffer has {} elements, input buffer {}",
                weights.len(),
                input.len()
            )));
        }
        if aliases(weights.storage(), input.storage()) {
            return Err(StreamAvgError::DispatchFailure(
                "weight and input arguments alias the same buffer".to_string(),
            ));
        }
        if t == 0 {
            return Err(StreamAvgError::DispatchFailure(
                "iteration count must be at least 1".to_string(),
            ));
        }
        if self.take_fault(Fault::Dispatch) {
            return Err(StreamAvgError::DispatchFailure(
                "injected enqueue failure".to_string(),
            ));
        }

        self.queue.enqueue(Command::Update {
            weights: Arc::clone(weights.storage()),
            input: Arc::clone(input.storage()),
            t,
        });
        Ok(())
    }

    fn map_read(&mut self, buffer: &SimBuffer) -> Result<Vec<f32>> {
        if self.take_fault(Fault::Map) {
            return Err(StreamAvgError::MapFailure(
                "injected map failure".to_string(),
            ));
        }

        self.queue.finish();
        let data = buffer.storage().read().clone();
        Ok(data)
    }
}
