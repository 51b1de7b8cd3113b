//! Error types used by the supervisor runtime.
//!
//! Three enums, matching the propagation policy:
//!
//! - [`LaunchError`] — synchronous failures of `launch`/`start_*`.
//! - [`CommandError`] — synchronous failures of registry commands
//!   (`attach`, `kill`, `evict`) on unknown or non-terminal ids.
//! - [`RuntimeError`] — failures of the supervisor itself (shutdown grace
//!   exceeded).
//!
//! Crash detection never raises an error to the caller of `launch`; crashes
//! are reported asynchronously via the event bus as a
//! [`CrashReason`](crate::CrashReason) classification.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::runtimes::RuntimeId;

/// Errors returned synchronously by `launch` and the `start_*` wrappers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The resolved executable does not exist.
    #[error("executable not found: {path}")]
    NotFound {
        /// Path the launcher tried to execute.
        path: PathBuf,
    },

    /// The OS denied spawning the executable.
    #[error("spawn denied by OS: {path}")]
    PermissionDenied {
        /// Path the launcher tried to execute.
        path: PathBuf,
    },

    /// Any other spawn failure.
    #[error("spawn failed: {source}")]
    Spawn {
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The venv discovery source failed while resolving an interpreter.
    #[error("venv discovery failed: {source}")]
    Discovery {
        /// Underlying io error from the discovery source.
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LaunchError::NotFound { .. } => "launch_not_found",
            LaunchError::PermissionDenied { .. } => "launch_permission_denied",
            LaunchError::Spawn { .. } => "launch_spawn_failed",
            LaunchError::Discovery { .. } => "launch_discovery_failed",
        }
    }
}

/// Errors returned synchronously by commands addressing a runtime id.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// No instance with this id is present in the registry.
    #[error("unknown runtime: {id}")]
    NotFound {
        /// The id the command addressed.
        id: RuntimeId,
    },

    /// Eviction of an instance that has not reached a terminal state.
    #[error("runtime {id} has not reached a terminal state")]
    NotTerminal {
        /// The id the command addressed.
        id: RuntimeId,
    },
}

impl CommandError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandError::NotFound { .. } => "command_not_found",
            CommandError::NotTerminal { .. } => "command_not_terminal",
        }
    }
}

/// Errors produced by the supervisor runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period exceeded; some runtimes had to be left behind.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of instances that did not reach a terminal state in time.
        stuck: Vec<RuntimeId>,
    },
}

impl RuntimeError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
