//! # Global supervisor configuration.
//!
//! [`Config`] centralizes the runtime settings of the supervisor:
//!
//! - **Shutdown behavior**: grace period for teardown, TERM→KILL escalation
//! - **Event system**: bus capacity for event delivery
//! - **Readiness**: per-kind grace windows for the `Starting → Running`
//!   transition
//! - **Invocations**: programs for the bundled sync-server and monitor
//!   executables, and the arguments handed to venv interpreters
//!
//! ## Readiness model
//! The supervised runtimes expose no common health-probe surface, so
//! readiness is a fixed per-kind grace period: a child still alive
//! `ready_after(kind)` after spawn is considered `Running`. `launch` never
//! blocks on this window; the transition is observed asynchronously.

use std::path::PathBuf;
use std::time::Duration;

use crate::runtimes::RuntimeKind;

/// Program and base arguments for one bundled runtime executable.
///
/// The launcher appends the target path as the final argument.
#[derive(Debug, Clone)]
pub struct ProgramSpec {
    /// Executable path (absolute, or resolved via `PATH`).
    pub program: PathBuf,
    /// Base arguments, before the target path.
    pub args: Vec<String>,
}

impl ProgramSpec {
    /// Spec with the given program and no base arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

/// Global configuration for the supervisor runtime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum wait for live runtimes to reach a terminal state during
    /// [`Supervisor::shutdown`](crate::Supervisor::shutdown) before giving
    /// up with `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Wait between the graceful termination request (SIGTERM on unix) and
    /// forceful kill escalation (SIGKILL).
    pub kill_grace: Duration,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Subscribers lagging behind by more than this many events observe
    /// `Lagged` and skip older items. Minimum 1 (clamped by the Bus).
    pub bus_capacity: usize,

    /// Readiness window for Python kernels.
    pub kernel_ready_after: Duration,
    /// Readiness window for the sync server.
    pub sync_ready_after: Duration,
    /// Readiness window for the filesystem monitor.
    pub monitor_ready_after: Duration,

    /// Invocation for the bundled document-sync server.
    pub sync_server: ProgramSpec,
    /// Invocation for the bundled filesystem monitor.
    pub monitor: ProgramSpec,
    /// Arguments handed to the venv interpreter when launching a kernel.
    pub kernel_args: Vec<String>,
}

impl Config {
    /// Readiness window for the given runtime kind.
    #[inline]
    pub fn ready_after(&self, kind: RuntimeKind) -> Duration {
        match kind {
            RuntimeKind::PythonKernel => self.kernel_ready_after,
            RuntimeKind::SyncServer => self.sync_ready_after,
            RuntimeKind::Monitor => self.monitor_ready_after,
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 10s`, `kill_grace = 3s`
    /// - `bus_capacity = 1024`
    /// - readiness: kernel 1000ms, sync server 500ms, monitor 250ms
    /// - sync server/monitor resolved from `PATH` by their bundled names
    /// - kernels started with `-m editor_kernel`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            kill_grace: Duration::from_secs(3),
            bus_capacity: 1024,
            kernel_ready_after: Duration::from_millis(1000),
            sync_ready_after: Duration::from_millis(500),
            monitor_ready_after: Duration::from_millis(250),
            sync_server: ProgramSpec::new("editor-sync-server"),
            monitor: ProgramSpec::new("editor-fs-monitor"),
            kernel_args: vec!["-m".into(), "editor_kernel".into()],
        }
    }
}
