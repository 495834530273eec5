//! Error types for streamavg.
//!
//! Every device-API status is checked immediately after the call; failures
//! are converted into [`StreamAvgError`] and propagated with `?`. The status
//! boundary in the `streamavg` crate classifies them via [`ErrorKind`].

use thiserror::Error;

/// Result type alias for streamavg operations.
pub type Result<T> = std::result::Result<T, StreamAvgError>;

/// Errors raised by the compute-offload engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamAvgError {
    /// No qualifying accelerator device was found.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The kernel program failed to build.
    #[error("Kernel compilation failed:\n{kernel_log}")]
    CompilationFailure {
        /// Full build log reported by the compiler.
        kernel_log: String,
    },

    /// Buffer or context allocation failed.
    #[error("Allocation of {requested} bytes failed: {reason}")]
    AllocationFailure {
        /// Requested size in bytes.
        requested: usize,
        /// Reason reported by the device.
        reason: String,
    },

    /// Argument binding or kernel enqueue failed.
    #[error("Dispatch failed: {0}")]
    DispatchFailure(String),

    /// Blocking readback of a device buffer failed.
    #[error("Map failed: {0}")]
    MapFailure(String),

    /// Sample vector length differs from the engine capacity.
    #[error("Sample has {actual} elements, expected {expected}")]
    InvalidSample {
        /// Engine vector capacity.
        expected: usize,
        /// Length of the supplied sample.
        actual: usize,
    },

    /// The caller-supplied iteration count is out of sequence.
    #[error("Iteration count {actual} out of sequence, expected {expected}")]
    IterationMismatch {
        /// Next iteration the engine expects.
        expected: u32,
        /// Iteration supplied by the caller.
        actual: u32,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation requires a step of initialization that has not run yet.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Raw device-API status that does not map onto a narrower kind.
    #[error("{mnemonic} ({code}): {context}")]
    Backend {
        /// Numeric status code.
        code: i32,
        /// Human-readable mnemonic for the code.
        mnemonic: &'static str,
        /// Operation that produced the status.
        context: String,
    },
}

/// Coarse classification of [`StreamAvgError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No qualifying device; non-fatal to the host application.
    DeviceUnavailable,
    /// Program build failure.
    Compilation,
    /// Buffer, context or queue creation failure.
    Allocation,
    /// Update-call failure; prior state is preserved.
    Dispatch,
    /// Readback failure.
    Map,
    /// Configuration or sequencing error.
    Config,
}

impl StreamAvgError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamAvgError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            StreamAvgError::CompilationFailure { .. } => ErrorKind::Compilation,
            StreamAvgError::AllocationFailure { .. } => ErrorKind::Allocation,
            StreamAvgError::DispatchFailure(_)
            | StreamAvgError::InvalidSample { .. }
            | StreamAvgError::IterationMismatch { .. } => ErrorKind::Dispatch,
            StreamAvgError::MapFailure(_) => ErrorKind::Map,
            StreamAvgError::InvalidConfig(_) | StreamAvgError::NotInitialized(_) => {
                ErrorKind::Config
            }
            StreamAvgError::Backend { .. } => ErrorKind::Allocation,
        }
    }

    /// Whether the host application may fall back instead of aborting.
    pub fn is_device_unavailable(&self) -> bool {
        self.kind() == ErrorKind::DeviceUnavailable
    }
}
