//! The running-average engine.

use tracing::{debug, info, warn};

use streamavg_core::backend::{BackendKind, ComputeBackend};
use streamavg_core::capability::{DeviceCapabilities, MemoryModel};
use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::host::HostReference;
use streamavg_core::report::ConsistencyReport;
use streamavg_core::residency::ResidencyPlan;
use streamavg_core::timing::TimingAccumulators;

use crate::buffers::VectorBuffers;
use crate::config::EngineConfig;

/// Keeps the running average of a stream of float vectors on a device, with
/// a host mirror for validation.
///
/// Owns the backend and every buffer allocated on it. Dropping the engine
/// releases the buffers, then the backend's kernels, program, queue and
/// context.
pub struct RunningAverageEngine<B: ComputeBackend> {
    buffers: VectorBuffers<B::Buffer>,
    host: HostReference,
    plan: ResidencyPlan,
    timing: TimingAccumulators,
    applied: u32,
    report_head: usize,
    backend: B,
}

impl<B: ComputeBackend> RunningAverageEngine<B> {
    /// Build `source`, choose the residency plan and allocate zeroed buffers.
    ///
    /// `source` must declare the `fillZero` and `UpdateWeights` kernels.
    pub fn initialize(mut backend: B, source: &str, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing {} engine on '{}'",
            backend.kind(),
            backend.capabilities().name
        );

        backend.build_program(source, &config.build_options)?;

        let plan = ResidencyPlan::from_capabilities(backend.capabilities())?
            .clamped(config.capacity_limit)?;
        let buffers = VectorBuffers::allocate(&mut backend, &plan)?;
        let host = HostReference::zeros(plan.size);

        info!(
            "Engine ready: {} elements, {} memory",
            plan.size, plan.memory_model
        );

        Ok(Self {
            buffers,
            host,
            plan,
            timing: TimingAccumulators::new(),
            applied: 0,
            report_head: config.report_head,
            backend,
        })
    }

    /// Apply one sample at iteration `t` on the device and on the host.
    ///
    /// `t` must be one more than the number of updates applied so far and
    /// `sample` must hold exactly [`vector_size`](Self::vector_size) floats.
    /// On error neither the device weights nor the host mirror change.
    pub fn update(&mut self, sample: &[f32], t: u32) -> Result<()> {
        if sample.len() != self.plan.size {
            return Err(StreamAvgError::InvalidSample {
                expected: self.plan.size,
                actual: sample.len(),
            });
        }
        let expected = self.next_iteration()?;
        if t != expected {
            return Err(StreamAvgError::IterationMismatch {
                expected,
                actual: t,
            });
        }

        let Self {
            buffers,
            backend,
            timing,
            host,
            ..
        } = self;

        timing.time_device(|| buffers.dispatch_update(backend, sample, t))?;
        timing.time_host(|| host.apply(sample, t))?;

        self.applied = t;
        debug!("Applied update t = {}", t);
        Ok(())
    }

    /// Apply one sample using the engine's own iteration counter.
    pub fn step(&mut self, sample: &[f32]) -> Result<u32> {
        let t = self.next_iteration()?;
        self.update(sample, t)?;
        Ok(t)
    }

    /// Vector capacity chosen by the residency strategy.
    pub fn vector_size(&self) -> usize {
        self.plan.size
    }

    /// Block until queued work completes and return the device weights.
    pub fn readback(&mut self) -> Result<Vec<f32>> {
        self.buffers.read_weights(&mut self.backend)
    }

    /// Compare device and host vectors and summarize timings.
    ///
    /// Read-only: repeated calls without an update in between return
    /// identical reports.
    pub fn report(&mut self) -> Result<ConsistencyReport> {
        let device = self.readback()?;
        let report = ConsistencyReport::new(
            self.host.weights(),
            &device,
            self.applied,
            self.timing.host_ms(),
            self.timing.device_ms(),
            self.report_head,
        );

        if report.norms.relative().is_infinite() {
            warn!("Host weights are zero but device weights are not");
        }
        Ok(report)
    }

    /// Host mirror of the weight vector.
    pub fn host_weights(&self) -> &[f32] {
        self.host.weights()
    }

    /// Number of updates applied.
    pub fn updates(&self) -> u32 {
        self.applied
    }

    /// Capabilities of the device the engine runs on.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        self.backend.capabilities()
    }

    /// Memory model of the device.
    pub fn memory_model(&self) -> MemoryModel {
        self.plan.memory_model
    }

    /// The residency plan in use.
    pub fn plan(&self) -> &ResidencyPlan {
        &self.plan
    }

    /// Accumulated host and device time.
    pub fn timing(&self) -> &TimingAccumulators {
        &self.timing
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn next_iteration(&self) -> Result<u32> {
        self.applied.checked_add(1).ok_or_else(|| {
            StreamAvgError::DispatchFailure("iteration counter exhausted".to_string())
        })
    }
}

/// Object-safe view of an engine, independent of its backend.
pub trait StreamEngine: Send {
    /// Backend kind the engine runs on.
    fn backend_kind(&self) -> BackendKind;

    /// See [`RunningAverageEngine::update`].
    fn update(&mut self, sample: &[f32], t: u32) -> Result<()>;

    /// See [`RunningAverageEngine::step`].
    fn step(&mut self, sample: &[f32]) -> Result<u32>;

    /// See [`RunningAverageEngine::vector_size`].
    fn vector_size(&self) -> usize;

    /// See [`RunningAverageEngine::readback`].
    fn readback(&mut self) -> Result<Vec<f32>>;

    /// See [`RunningAverageEngine::report`].
    fn report(&mut self) -> Result<ConsistencyReport>;

    /// See [`RunningAverageEngine::updates`].
    fn updates(&self) -> u32;

    /// See [`RunningAverageEngine::capabilities`].
    fn capabilities(&self) -> &DeviceCapabilities;

    /// See [`RunningAverageEngine::plan`].
    fn plan(&self) -> &ResidencyPlan;
}

impl<B: ComputeBackend> StreamEngine for RunningAverageEngine<B> {
    fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    fn update(&mut self, sample: &[f32], t: u32) -> Result<()> {
        RunningAverageEngine::update(self, sample, t)
    }

    fn step(&mut self, sample: &[f32]) -> Result<u32> {
        RunningAverageEngine::step(self, sample)
    }

    fn vector_size(&self) -> usize {
        RunningAverageEngine::vector_size(self)
    }

    fn readback(&mut self) -> Result<Vec<f32>> {
        RunningAverageEngine::readback(self)
    }

    fn report(&mut self) -> Result<ConsistencyReport> {
        RunningAverageEngine::report(self)
    }

    fn updates(&self) -> u32 {
        RunningAverageEngine::updates(self)
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        RunningAverageEngine::capabilities(self)
    }

    fn plan(&self) -> &ResidencyPlan {
        RunningAverageEngine::plan(self)
    }
}
