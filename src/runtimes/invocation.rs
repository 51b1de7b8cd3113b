//! # Per-kind child process invocation.
//!
//! Resolves a `(kind, target)` pair into the concrete program, arguments,
//! working directory and environment used to spawn the child, and performs
//! the spawn with the io-error mapping the launch contract requires.
//!
//! ## Resolution rules
//! - `PythonKernel`: program is the target venv's interpreter
//!   (`<venv>/bin/python`, `<venv>/Scripts/python.exe` on Windows), args from
//!   [`Config::kernel_args`](crate::Config).
//! - `SyncServer` / `Monitor`: program and base args from the configured
//!   [`ProgramSpec`](crate::ProgramSpec); the target path is appended as the
//!   final argument and used as the working directory.
//! - [`LaunchOptions`] may add environment variables or override the
//!   working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::Config;
use crate::error::LaunchError;
use crate::runtimes::kind::RuntimeKind;

/// Caller-supplied launch options.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Spawn a new instance even when a live one serves the same
    /// `(kind, target)` pair. Ignored for singleton kinds, which always
    /// attach.
    pub force_new: bool,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Working directory override.
    pub cwd: Option<PathBuf>,
}

/// Fully resolved invocation for one child process.
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// Returns the interpreter path inside a venv.
pub(crate) fn python_interpreter(venv: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        venv.join("Scripts").join("python.exe")
    }
    #[cfg(not(windows))]
    {
        venv.join("bin").join("python")
    }
}

/// Resolves the invocation for `(kind, target)` under the given config.
pub(crate) fn resolve(
    cfg: &Config,
    kind: RuntimeKind,
    target: &Path,
    opts: &LaunchOptions,
) -> Invocation {
    let (program, mut args, default_cwd) = match kind {
        RuntimeKind::PythonKernel => (python_interpreter(target), cfg.kernel_args.clone(), None),
        RuntimeKind::SyncServer => (
            cfg.sync_server.program.clone(),
            cfg.sync_server.args.clone(),
            Some(target.to_path_buf()),
        ),
        RuntimeKind::Monitor => (
            cfg.monitor.program.clone(),
            cfg.monitor.args.clone(),
            Some(target.to_path_buf()),
        ),
    };

    // Singleton runtimes receive their target explicitly; the kernel's
    // target is already baked into the interpreter path.
    if kind.is_singleton() {
        args.push(target.display().to_string());
    }

    Invocation {
        program,
        args,
        cwd: opts.cwd.clone().or(default_cwd),
        env: opts.env.clone(),
    }
}

impl Invocation {
    /// Spawns the child with wired stdio, mapping spawn failures into the
    /// launch error taxonomy.
    ///
    /// stdout/stderr are piped so the watcher can forward child output to
    /// the log; stdin is closed.
    pub(crate) fn spawn(&self) -> Result<Child, LaunchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LaunchError::NotFound {
                path: self.program.clone(),
            },
            std::io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied {
                path: self.program.clone(),
            },
            _ => LaunchError::Spawn { source: e },
        })
    }
}
