//! Status-code interface for hosts that cannot receive Rust errors.
//!
//! [`EngineHandle`] wraps an engine behind calls that only return integer
//! status codes, sizes or plain data. Every error is logged and mapped to a
//! failure code; nothing panics or unwinds across this interface.

use tracing::error;

use streamavg_core::capability::MemoryModel;
use streamavg_core::error::StreamAvgError;

use crate::config::EngineConfig;
use crate::connect;
use crate::engine::StreamEngine;

/// Result of [`EngineHandle::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum InitStatus {
    /// No device, compilation failed or allocation failed.
    Failure = 0,
    /// Ready on a device with dedicated memory.
    Discrete = 1,
    /// Ready on a device sharing memory with the host.
    Unified = 2,
}

impl InitStatus {
    /// Integer code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<MemoryModel> for InitStatus {
    fn from(model: MemoryModel) -> Self {
        match model {
            MemoryModel::Discrete => InitStatus::Discrete,
            MemoryModel::Unified => InitStatus::Unified,
        }
    }
}

/// Result of [`EngineHandle::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum UpdateStatus {
    /// The update was not applied.
    Failure = 0,
    /// Weights and host mirror advanced one step.
    Success = 1,
}

impl UpdateStatus {
    /// Integer code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Engine slot driven through status codes.
#[derive(Default)]
pub struct EngineHandle {
    engine: Option<Box<dyn StreamEngine>>,
    last_error: Option<StreamAvgError>,
}

impl EngineHandle {
    /// Create an empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize an engine from `config` and kernel `source`.
    ///
    /// Replaces (and releases) any engine the handle already holds.
    pub fn initialize(&mut self, config: &EngineConfig, source: &str) -> InitStatus {
        self.engine = None;
        match connect(config, source) {
            Ok(engine) => {
                let status = InitStatus::from(engine.plan().memory_model);
                self.engine = Some(engine);
                self.last_error = None;
                status
            }
            Err(e) => {
                if e.is_device_unavailable() {
                    error!("No compute device available: {}", e);
                } else {
                    error!("Engine initialization failed: {}", e);
                }
                self.last_error = Some(e);
                InitStatus::Failure
            }
        }
    }

    /// Wrap an already initialized engine.
    pub fn from_engine(engine: Box<dyn StreamEngine>) -> Self {
        Self {
            engine: Some(engine),
            last_error: None,
        }
    }

    /// Whether an engine is loaded.
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Vector capacity, or 0 when uninitialized.
    pub fn vector_size(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.vector_size())
    }

    /// Apply one sample at iteration `t`.
    pub fn update(&mut self, sample: &[f32], t: u32) -> UpdateStatus {
        let result = match self.engine.as_mut() {
            Some(engine) => engine.update(sample, t),
            None => Err(not_initialized()),
        };
        match result {
            Ok(()) => UpdateStatus::Success,
            Err(e) => {
                error!("Update {} failed: {}", t, e);
                self.last_error = Some(e);
                UpdateStatus::Failure
            }
        }
    }

    /// Current device weights, or an empty vector on failure.
    pub fn readback(&mut self) -> Vec<f32> {
        let result = match self.engine.as_mut() {
            Some(engine) => engine.readback(),
            None => Err(not_initialized()),
        };
        result.unwrap_or_else(|e| {
            error!("Readback failed: {}", e);
            self.last_error = Some(e);
            Vec::new()
        })
    }

    /// Formatted consistency and timing report.
    ///
    /// On failure the text describes the error instead.
    pub fn report(&mut self) -> String {
        let result = match self.engine.as_mut() {
            Some(engine) => engine.report(),
            None => Err(not_initialized()),
        };
        match result {
            Ok(report) => report.to_string(),
            Err(e) => {
                error!("Report failed: {}", e);
                let text = format!("Report unavailable: {}", e);
                self.last_error = Some(e);
                text
            }
        }
    }

    /// The most recent error, if the last failing call produced one.
    pub fn last_error(&self) -> Option<&StreamAvgError> {
        self.last_error.as_ref()
    }

    /// Release the engine and every device resource it holds.
    pub fn shutdown(&mut self) {
        self.engine = None;
    }
}

fn not_initialized() -> StreamAvgError {
    StreamAvgError::NotInitialized("engine handle holds no engine".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamavg_core::kernels::RUNNING_AVERAGE_CL;
    use streamavg_sim::{SimBackend, SimProfile};

    use crate::engine::RunningAverageEngine;

    fn config(profile: SimProfile) -> EngineConfig {
        EngineConfig::builder()
            .profile(profile)
            .capacity_limit(4)
            .build()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(InitStatus::Failure.code(), 0);
        assert_eq!(InitStatus::Discrete.code(), 1);
        assert_eq!(InitStatus::Unified.code(), 2);
        assert_eq!(UpdateStatus::Failure.code(), 0);
        assert_eq!(UpdateStatus::Success.code(), 1);
    }

    #[test]
    fn test_initialize_reports_memory_model() {
        let mut handle = EngineHandle::new();
        assert_eq!(
            handle.initialize(&config(SimProfile::Discrete), RUNNING_AVERAGE_CL),
            InitStatus::Discrete
        );
        assert_eq!(
            handle.initialize(&config(SimProfile::Unified), RUNNING_AVERAGE_CL),
            InitStatus::Unified
        );
        assert_eq!(handle.vector_size(), 4);
    }

    #[test]
    fn test_absent_device() {
        let mut handle = EngineHandle::new();
        let status = handle.initialize(&config(SimProfile::Absent), RUNNING_AVERAGE_CL);
        assert_eq!(status, InitStatus::Failure);
        assert!(!handle.is_initialized());
        assert!(handle.last_error().unwrap().is_device_unavailable());
        assert_eq!(handle.vector_size(), 0);
    }

    #[test]
    fn test_uninitialized_calls_fail_quietly() {
        let mut handle = EngineHandle::new();
        assert_eq!(handle.update(&[1.0], 1), UpdateStatus::Failure);
        assert!(handle.readback().is_empty());
        assert!(handle.report().starts_with("Report unavailable"));
    }

    #[test]
    fn test_update_status() {
        let mut handle = EngineHandle::new();
        handle.initialize(&config(SimProfile::Discrete), RUNNING_AVERAGE_CL);

        assert_eq!(handle.update(&[1.0, 2.0, 3.0, 4.0], 1), UpdateStatus::Success);
        assert_eq!(handle.update(&[1.0, 2.0, 3.0, 4.0], 3), UpdateStatus::Failure);
        assert_eq!(handle.readback(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(handle.report().contains("4 elements were updated 1 time(s)"));

        handle.shutdown();
        assert!(!handle.is_initialized());
    }

    #[test]
    fn test_wrapped_engine_released_on_shutdown() {
        let backend = SimBackend::new(SimProfile::Discrete).unwrap();
        let tracker = backend.memory_tracker();
        let engine = RunningAverageEngine::initialize(
            backend,
            RUNNING_AVERAGE_CL,
            &config(SimProfile::Discrete),
        )
        .unwrap();

        let mut handle = EngineHandle::from_engine(Box::new(engine));
        assert!(handle.is_initialized());
        assert_eq!(handle.vector_size(), 4);
        assert_eq!(handle.update(&[2.0; 4], 1), UpdateStatus::Success);
        assert_eq!(handle.readback(), vec![2.0; 4]);
        assert!(!tracker.is_released());

        handle.shutdown();
        assert!(!handle.is_initialized());
        assert!(tracker.is_released());
        assert_eq!(handle.vector_size(), 0);
    }
}
