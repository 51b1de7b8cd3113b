//! # Runtime kinds supervised by the editor.
//!
//! [`RuntimeKind`] names the three background runtimes the supervisor can
//! launch on behalf of the editor:
//!
//! - [`RuntimeKind::PythonKernel`] a Python execution kernel bound to a venv.
//! - [`RuntimeKind::SyncServer`] the document synchronization server for a project.
//! - [`RuntimeKind::Monitor`] the filesystem-change monitor for a project.
//!
//! ## Singleton rule
//! `SyncServer` and `Monitor` are **singleton-per-target**: at most one
//! running instance may exist for a given target path, and launching a
//! duplicate attaches to the existing instance instead. Python kernels are
//! non-singleton; several kernels may serve the same venv when explicitly
//! forced.

use serde::{Deserialize, Serialize};

/// Kind of a supervised background runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeKind {
    /// Python execution kernel. Target: a venv path.
    PythonKernel,
    /// Document synchronization server. Target: a project directory.
    SyncServer,
    /// Filesystem-change monitor. Target: a project directory.
    Monitor,
}

impl RuntimeKind {
    /// True when at most one running instance may exist per target.
    ///
    /// Duplicate launches for singleton kinds resolve by attaching to the
    /// existing instance (idempotent attach-or-create), never by error.
    #[inline]
    pub fn is_singleton(self) -> bool {
        matches!(self, RuntimeKind::SyncServer | RuntimeKind::Monitor)
    }

    /// Short stable label (kebab-case) for logs and events.
    pub fn as_label(self) -> &'static str {
        match self {
            RuntimeKind::PythonKernel => "python-kernel",
            RuntimeKind::SyncServer => "sync-server",
            RuntimeKind::Monitor => "monitor",
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}
