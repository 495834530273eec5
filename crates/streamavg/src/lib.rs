//! # streamavg
//!
//! Streaming running-average engine that offloads the per-sample update to a
//! compute device and keeps a sequential host mirror for validation.
//!
//! For every sample `x` at step `t` the device and the host both apply
//! `w <- w + (x - w) / t` over the whole vector. The reporter compares the
//! two results and the time spent on each side.
//!
//! ## Quick Start
//!
//! ```
//! use streamavg::prelude::*;
//!
//! let config = EngineConfig::builder().capacity_limit(4).build();
//! let mut engine = streamavg::connect(&config, RUNNING_AVERAGE_CL)?;
//!
//! engine.update(&[1.0, 0.0, 0.0, 0.0], 1)?;
//! engine.update(&[0.0, 1.0, 0.0, 0.0], 2)?;
//!
//! let report = engine.report()?;
//! assert!(report.relative_error_pct() < 1e-4);
//! println!("{}", report);
//! # Ok::<(), streamavg::StreamAvgError>(())
//! ```
//!
//! ## Backends
//!
//! - **Simulated** - Host thread pool standing in for a device (always available)
//! - **OpenCL** - First GPU of the first platform (requires the `opencl` feature)
//!
//! ## Status-code interface
//!
//! [`EngineHandle`] exposes the engine through integer status codes for
//! callers across a foreign-function boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(hidden_glob_reexports)]

pub mod boundary;
pub mod buffers;
pub mod config;
pub mod engine;

// Re-export core types
pub use streamavg_core::*;

pub use boundary::{EngineHandle, InitStatus, UpdateStatus};
pub use buffers::VectorBuffers;
pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_CONFIG_FILE};
pub use engine::{RunningAverageEngine, StreamEngine};

// Backends
pub use streamavg_opencl::{is_opencl_available, OpenClBackend};
pub use streamavg_sim::{Fault, MemoryTracker, SimBackend, SimProfile};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::boundary::{EngineHandle, InitStatus, UpdateStatus};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{RunningAverageEngine, StreamEngine};
    pub use streamavg_core::prelude::*;
    pub use streamavg_opencl::OpenClBackend;
    pub use streamavg_sim::{SimBackend, SimProfile};
}

/// Probe the backend selected by `config` and initialize an engine on it.
pub fn connect(config: &EngineConfig, source: &str) -> Result<Box<dyn StreamEngine>> {
    let engine: Box<dyn StreamEngine> = match config.backend {
        BackendKind::Simulated => {
            let backend = SimBackend::new(config.profile)?;
            Box::new(RunningAverageEngine::initialize(backend, source, config)?)
        }
        BackendKind::OpenCl => {
            let backend = OpenClBackend::probe()?;
            Box::new(RunningAverageEngine::initialize(backend, source, config)?)
        }
    };
    Ok(engine)
}
