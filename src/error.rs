use std::process::ExitStatus;

use thiserror::Error;

use crate::device::accessor::Window;

#[derive(Debug, Error)]
pub enum TraversalError {
    /// Connection to the device is gone; aborts the run.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single interaction or discovery query failed.
    #[error("Action on '{target}' failed: {reason}")]
    ActionFailed { target: String, reason: String },

    /// The window after an interaction differs from the one before it and a
    /// back press did not restore it.
    #[error("Navigation drift: expected {expected}, found {actual}")]
    NavigationDrift { expected: Window, actual: Window },

    /// The on-device automation server answered with an error.
    #[error("Device RPC '{method}' failed: {message}")]
    Rpc { method: String, message: String },

    #[error("Failed to spawn {program} (is it on PATH?): {source}")]
    SubprocessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    SubprocessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Hierarchy dump did not have the expected shape.
    #[error("Unexpected hierarchy structure: {0}")]
    Hierarchy(String),

    #[error("Artifact I/O error ({context}): {source}")]
    ArtifactIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TraversalError {
    pub fn action_failed(target: impl ToString, reason: impl ToString) -> Self {
        TraversalError::ActionFailed {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Only a lost device connection escapes element-level isolation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TraversalError::DeviceUnavailable(_))
    }
}
