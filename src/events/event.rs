//! # Lifecycle events emitted by the supervisor.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Runtime lifecycle**: spawn, readiness, termination of one instance
//! - **Supervisor teardown**: shutdown request and grace outcome
//! - **Fan-out self-reporting**: subscriber overflow and panics
//!
//! [`Event`] is an immutable record, never mutated after creation and
//! consumed once per subscriber (fan-out, not a shared queue). Death events
//! carry the exit code, signal, reason and target so the consuming surface
//! can locate the affected project without a follow-up query.
//!
//! ## Ordering guarantees
//! Every event carries a globally unique, monotonically increasing
//! sequence number (`seq`). For a given runtime id, events are published
//! in lifecycle order: `started → (ready) → exited | died`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::classify::CrashReason;
use crate::runtimes::{ExitInfo, RuntimeId, RuntimeKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    // === Runtime lifecycle ===
    /// Child spawned and registered (instance in `Starting` state).
    ///
    /// Sets: `runtime`, `runtime_kind`, `target`, `pid`.
    RuntimeStarted,

    /// Instance survived its readiness window (`Starting → Running`).
    ///
    /// Sets: `runtime`, `runtime_kind`, `target`, `pid`.
    RuntimeReady,

    /// Instance reached `Exited`: clean shutdown or supervisor kill.
    ///
    /// Sets: `runtime`, `runtime_kind`, `target`, `pid`, `exit_code`,
    /// `signal`, `reason` (`clean` or `killed`).
    RuntimeExited,

    /// Instance reached `Crashed`: unrequested, non-clean termination.
    ///
    /// The sole signal the consuming surface has to trigger user-facing
    /// data-loss mitigation. Sets: `runtime`, `runtime_kind`, `target`,
    /// `pid`, `exit_code`, `signal`, `reason` (`crash`).
    RuntimeDied,

    // === Supervisor teardown ===
    /// Supervisor shutdown begun; all live runtimes are being killed.
    ShutdownRequested,

    /// All runtimes reached a terminal state within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some runtimes were left behind.
    GraceExceeded,

    // === Fan-out self-reporting ===
    /// A subscriber's queue was full or closed; an event was dropped for it.
    ///
    /// Sets: `note` (subscriber name and cause).
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `note` (subscriber name and panic info).
    SubscriberPanicked,
}

/// Immutable lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Id of the runtime instance, if applicable.
    pub runtime: Option<RuntimeId>,
    /// Kind of the runtime instance, if applicable.
    pub runtime_kind: Option<RuntimeKind>,
    /// Target path of the runtime instance, if applicable.
    pub target: Option<Arc<str>>,
    /// OS pid of the child, if applicable.
    pub pid: Option<u32>,
    /// Exit code of a terminated child.
    pub exit_code: Option<i32>,
    /// Terminating signal of a terminated child (unix only).
    pub signal: Option<i32>,
    /// Termination classification for `RuntimeExited`/`RuntimeDied`.
    pub reason: Option<CrashReason>,
    /// Free-form detail (fan-out self-reporting).
    pub note: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp
    /// and the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            runtime: None,
            runtime_kind: None,
            target: None,
            pid: None,
            exit_code: None,
            signal: None,
            reason: None,
            note: None,
        }
    }

    /// Attaches the runtime id.
    #[inline]
    pub fn with_runtime(mut self, id: RuntimeId) -> Self {
        self.runtime = Some(id);
        self
    }

    /// Attaches the runtime kind.
    #[inline]
    pub fn with_runtime_kind(mut self, kind: RuntimeKind) -> Self {
        self.runtime_kind = Some(kind);
        self
    }

    /// Attaches the target path.
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches the child pid.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches exit code and signal from recorded exit info.
    #[inline]
    pub fn with_exit(mut self, exit: &ExitInfo) -> Self {
        self.exit_code = exit.code;
        self.signal = exit.signal;
        self
    }

    /// Attaches the termination classification.
    #[inline]
    pub fn with_reason(mut self, reason: CrashReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attaches a free-form detail note.
    #[inline]
    pub fn with_note(mut self, note: impl Into<Arc<str>>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_note(format!("subscriber={subscriber} cause={cause}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked).with_note(format!("subscriber={subscriber} {info}"))
    }

    /// True for fan-out self-reporting events, which must never be
    /// re-reported on overflow (feedback loop).
    #[inline]
    pub fn is_fanout_report(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }

    /// True for the terminal lifecycle events of a runtime instance.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::RuntimeExited | EventKind::RuntimeDied)
    }
}
