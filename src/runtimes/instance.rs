//! # Runtime instance data model.
//!
//! Defines the identity and state of one supervised child process:
//!
//! - [`RuntimeId`] opaque identity, unique for the supervisor's lifetime;
//! - [`RuntimeStatus`] monotonic lifecycle state with write-once terminals;
//! - [`ExitInfo`] recorded termination details;
//! - [`RuntimeInstance`] the value snapshot handed across the trust boundary.
//!
//! ## Rules
//! - Exactly one `RuntimeInstance` exists per live child process.
//! - Ids are never reused.
//! - Status only moves forward: no instance returns to `Running` after a
//!   terminal state.
//! - The interactive surface only ever sees snapshots, never OS handles.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::runtimes::kind::RuntimeKind;

/// Opaque identity of a runtime instance.
///
/// Backed by a v4 UUID so ids stay unique for the supervisor's process
/// lifetime and are never reused after eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(Uuid);

impl RuntimeId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a runtime instance.
///
/// Transitions are monotonic:
/// ```text
/// Starting ──► Running ──► Exiting ──► Exited
///     │            │           │
///     │            └───────────┼─────► Crashed
///     └────────────────────────┴─────► Exited | Crashed
/// ```
/// `Exited` and `Crashed` are terminal and write-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeStatus {
    /// Child spawned, readiness not yet observed.
    Starting,
    /// Child survived its readiness window.
    Running,
    /// Termination requested by the supervisor, exit not yet observed.
    Exiting,
    /// Terminal: clean shutdown or supervisor-requested kill.
    Exited,
    /// Terminal: unrequested, non-clean termination.
    Crashed,
}

impl RuntimeStatus {
    /// True for non-terminal states (`Starting`, `Running`, `Exiting`).
    #[inline]
    pub fn is_live(self) -> bool {
        !self.is_terminal()
    }

    /// True for `Exited` and `Crashed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, RuntimeStatus::Exited | RuntimeStatus::Crashed)
    }

    /// Short stable label (kebab-case) for logs and events.
    pub fn as_label(self) -> &'static str {
        match self {
            RuntimeStatus::Starting => "starting",
            RuntimeStatus::Running => "running",
            RuntimeStatus::Exiting => "exiting",
            RuntimeStatus::Exited => "exited",
            RuntimeStatus::Crashed => "crashed",
        }
    }
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Recorded termination details of a runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal (unix only; `None` elsewhere).
    pub signal: Option<i32>,
    /// When the termination was observed.
    pub at: SystemTime,
}

/// Snapshot of one supervised runtime instance.
///
/// This is a plain value: the supervisor owns the child process handle
/// exclusively, consumers get copies of this record via queries and events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeInstance {
    /// Opaque identity, unique for the supervisor's lifetime.
    pub id: RuntimeId,
    /// What this runtime is.
    pub kind: RuntimeKind,
    /// The path this runtime operates on (venv or project directory).
    pub target: PathBuf,
    /// OS process id of the child.
    pub pid: u32,
    /// When the child was spawned.
    pub started_at: SystemTime,
    /// Current lifecycle state.
    pub status: RuntimeStatus,
    /// Termination details, set once a terminal state is reached.
    pub last_exit: Option<ExitInfo>,
}
