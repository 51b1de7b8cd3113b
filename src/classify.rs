//! # Termination classification.
//!
//! Every observed child termination is classified into a [`CrashReason`]
//! before the registry records it. The distinction is load-bearing: only
//! unrequested, non-clean terminations are escalated as crashes that
//! trigger user-visible data-loss mitigation downstream.
//!
//! ## Rules (evaluated in order)
//! 1. Termination was requested by the supervisor → [`CrashReason::Killed`].
//! 2. Exit code `0` and no signal → [`CrashReason::Clean`].
//! 3. Otherwise → [`CrashReason::Crash`], exit code/signal carried verbatim.
//!
//! Rule 1 wins even when the child exits non-zero after receiving the
//! termination request: a requested kill is never reported as a crash.

use std::process::ExitStatus;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::runtimes::RuntimeStatus;

/// One observed child termination, as seen by the exit watcher.
#[derive(Debug, Clone, Copy)]
pub struct ExitObservation {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal (unix only; `None` elsewhere).
    pub signal: Option<i32>,
    /// Whether the supervisor requested this termination.
    pub requested: bool,
    /// When the termination was observed.
    pub at: SystemTime,
}

impl ExitObservation {
    /// Builds an observation from the OS exit status.
    pub fn from_status(status: ExitStatus, requested: bool) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            requested,
            at: SystemTime::now(),
        }
    }

    /// Observation for a child whose exit status could not be collected.
    ///
    /// Classifies as a crash unless termination was requested: an
    /// unreadable status must never pass for a clean shutdown.
    pub fn unknown(requested: bool) -> Self {
        Self {
            code: None,
            signal: None,
            requested,
            at: SystemTime::now(),
        }
    }
}

/// Why a runtime terminated.
///
/// A classification, not an error: `Clean` and `Killed` land the instance
/// in [`RuntimeStatus::Exited`], `Crash` in [`RuntimeStatus::Crashed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrashReason {
    /// Exit code 0, no signal, no kill request.
    Clean,
    /// Termination requested by the supervisor.
    Killed,
    /// Unrequested, non-clean termination.
    Crash,
}

impl CrashReason {
    /// True only for [`CrashReason::Crash`].
    #[inline]
    pub fn is_crash(self) -> bool {
        matches!(self, CrashReason::Crash)
    }

    /// Terminal status this reason lands the instance in.
    #[inline]
    pub fn terminal_status(self) -> RuntimeStatus {
        match self {
            CrashReason::Clean | CrashReason::Killed => RuntimeStatus::Exited,
            CrashReason::Crash => RuntimeStatus::Crashed,
        }
    }

    /// Short stable label (kebab-case) for logs and events.
    pub fn as_label(self) -> &'static str {
        match self {
            CrashReason::Clean => "clean",
            CrashReason::Killed => "killed",
            CrashReason::Crash => "crash",
        }
    }
}

impl std::fmt::Display for CrashReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Classifies one termination observation.
pub fn classify(obs: &ExitObservation) -> CrashReason {
    if obs.requested {
        return CrashReason::Killed;
    }
    if obs.code == Some(0) && obs.signal.is_none() {
        return CrashReason::Clean;
    }
    CrashReason::Crash
}
