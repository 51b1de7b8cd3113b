//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [started] runtime=… kind=sync-server target=/proj pid=4242
//! [ready] runtime=… kind=sync-server
//! [exited] runtime=… reason=killed code=Some(143)
//! [died] runtime=… kind=sync-server target=/proj code=None signal=Some(9)
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```
//!
//! Not intended for production use — implement a custom
//! [`Subscribe`](crate::Subscribe) for structured logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Stdout logging subscriber for development and demos.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RuntimeStarted => {
                println!(
                    "[started] runtime={:?} kind={:?} target={:?} pid={:?}",
                    e.runtime, e.runtime_kind, e.target, e.pid
                );
            }
            EventKind::RuntimeReady => {
                println!("[ready] runtime={:?} kind={:?}", e.runtime, e.runtime_kind);
            }
            EventKind::RuntimeExited => {
                println!(
                    "[exited] runtime={:?} reason={:?} code={:?}",
                    e.runtime, e.reason, e.exit_code
                );
            }
            EventKind::RuntimeDied => {
                println!(
                    "[died] runtime={:?} kind={:?} target={:?} code={:?} signal={:?}",
                    e.runtime, e.runtime_kind, e.target, e.exit_code, e.signal
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[fanout] note={:?}", e.note);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
