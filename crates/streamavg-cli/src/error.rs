//! Error types for the streamavg CLI.

use thiserror::Error;

use streamavg::StreamAvgError;

/// CLI result type alias.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine error.
    #[error("{0}")]
    Engine(StreamAvgError),

    /// The blocking engine task did not complete.
    #[error("Engine task failed: {0}")]
    Task(String),
}

impl From<StreamAvgError> for CliError {
    fn from(e: StreamAvgError) -> Self {
        match e {
            StreamAvgError::InvalidConfig(msg) => CliError::Config(msg),
            other => CliError::Engine(other),
        }
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(e: tokio::task::JoinError) -> Self {
        CliError::Task(e.to_string())
    }
}
