//! # Consumed discovery interfaces.
//!
//! The supervisor queries two external, read-only data sources; it
//! implements neither. The editor shell wires in concrete implementations
//! (bundled discovery helpers, caches, remote indexes):
//!
//! - [`VenvDiscovery`] — candidate Python interpreter paths for a project
//!   directory, used by
//!   [`Supervisor::start_python_for_project`](crate::Supervisor::start_python_for_project).
//! - [`FileScan`] — recently modified files under a root, consumed by the
//!   interactive surface alongside lifecycle events.
//!
//! Both feeds may be slow or streaming upstream; the trait surface is a
//! plain async call returning a finite batch.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Source of candidate Python interpreters for a project directory.
///
/// Candidates are ordered best-first; the supervisor launches the first
/// one whose venv spawns.
#[async_trait]
pub trait VenvDiscovery: Send + Sync {
    /// Returns candidate interpreter paths for `project`, best first.
    async fn interpreters(&self, project: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Source of recently modified files under a root directory.
#[async_trait]
pub trait FileScan: Send + Sync {
    /// Returns up to `limit` recently modified files under `root`,
    /// most recent first.
    async fn recent_files(&self, root: &Path, limit: usize) -> io::Result<Vec<PathBuf>>;
}
