//! Orchestrator builder

use super::{Orchestrator, Service, Signal};
use crate::config::OrchestratorConfig;
use crate::logger::{Logger, NopLogger};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`Orchestrator`]
///
/// Defaults: stop on interrupt and terminate, no shutdown deadline, no
/// logging.
pub struct OrchestratorBuilder {
    services: Vec<Arc<dyn Service>>,
    signals: Vec<Signal>,
    shutdown_timeout: Option<Duration>,
    logger: Arc<dyn Logger>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            signals: Signal::DEFAULT.to_vec(),
            shutdown_timeout: None,
            logger: Arc::new(NopLogger),
        }
    }

    /// Apply signal set and shutdown timeout from a config value
    pub fn config(self, config: &OrchestratorConfig) -> Self {
        let builder = self.signals(config.stop_signals.iter().copied());
        match config.shutdown_timeout() {
            Some(timeout) => builder.shutdown_timeout(timeout),
            None => builder.unbounded_shutdown(),
        }
    }

    /// Replace the set of signals that trigger shutdown
    ///
    /// An empty set means only [`Orchestrator::stop`] or a start error ends
    /// `serve`.
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Deadline handed to every stop call; zero means unbounded
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Let every stop call run without a deadline
    pub fn unbounded_shutdown(mut self) -> Self {
        self.shutdown_timeout = None;
        self
    }

    /// Set the logging sink
    pub fn logger<L>(mut self, logger: L) -> Self
    where
        L: Logger + 'static,
    {
        self.logger = Arc::new(logger);
        self
    }

    /// Set a logging sink that is also held elsewhere
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Register a service
    pub fn register<S>(mut self, service: S) -> Self
    where
        S: Service + 'static,
    {
        self.services.push(Arc::new(service));
        self
    }

    /// Register a service that is also held elsewhere
    pub fn register_shared(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator::from_parts(
            self.services,
            self.signals,
            self.shutdown_timeout,
            self.logger,
        )
    }
}
