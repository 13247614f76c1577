//! Error handling module for cloudmaint
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure is fatal to the runbook being generated, so nothing here is
//! downgraded to a warning: callers surface these unchanged.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for the maintenance workflow engine
#[derive(Error, Debug)]
pub enum MaintenanceError {
    /// The snapshot could not be parsed into the expected shape
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// No resource anywhere in the snapshot carries the requested maintenance id
    #[error("No resource is tagged with maintenance id '{0}'")]
    UnknownMaintenanceId(String),

    /// A resource record turned out to be inconsistent while building commands
    #[error("Step {step} failed to generate commands: {reason}")]
    StepGeneration { step: String, reason: String },

    /// Filesystem errors (output directory creation, command file writes)
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for maintenance engine operations
pub type Result<T> = std::result::Result<T, MaintenanceError>;

// Convenient error constructors
impl MaintenanceError {
    /// Create a malformed snapshot error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSnapshot(msg.into())
    }

    /// Create a step generation error
    pub fn step_generation(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StepGeneration {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an IO error together with the path it happened at
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for MaintenanceError {
    fn from(err: serde_json::Error) -> Self {
        MaintenanceError::MalformedSnapshot(err.to_string())
    }
}
