//! Builder wiring for [`Supervisor`](crate::Supervisor).
//!
//! Owns the assembly order: bus first, then the subscriber fan-out, then
//! the registry, and finally the fan-out listener task. Splitting this out
//! keeps `Supervisor` free of construction plumbing.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::registry::Registry;
use crate::core::supervisor::Supervisor;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Configures and assembles a [`Supervisor`].
///
/// ```no_run
/// use procvisor::{Config, Supervisor};
///
/// # async fn demo() {
/// let sup = Supervisor::builder(Config::default()).build();
/// let runtimes = sup.list_runtimes().await;
/// # }
/// ```
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    pub(crate) fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the subscriber list.
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subs;
        self
    }

    /// Appends one subscriber.
    pub fn with_subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Assembles the supervisor and spawns its fan-out listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let cfg = Arc::new(self.cfg);
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let runtime_token = CancellationToken::new();
        let registry = Registry::new(Arc::clone(&cfg), bus.clone(), runtime_token);

        let sup = Arc::new(Supervisor::new_internal(cfg, bus, subs, registry));
        sup.spawn_fanout_listener();
        sup
    }
}
