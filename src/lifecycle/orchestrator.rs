//! Orchestrator
//!
//! Starts every registered service concurrently, waits for a stop trigger or
//! the first start error, then stops every service concurrently.

use super::signals::SignalListener;
use super::supervisor::{self, Shared};
use super::{OrchestratorBuilder, Service, Signal, StopTrigger};
use crate::error::{LifecycleError, Result};
use crate::logger::Logger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs a set of services from start to graceful shutdown
///
/// # Example
///
/// ```rust,ignore
/// use overseer::{Orchestrator, TracingLogger};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), overseer::LifecycleError> {
///     let orchestrator = Orchestrator::builder()
///         .shutdown_timeout(Duration::from_secs(10))
///         .logger(TracingLogger)
///         .register(http_service)
///         .register(scheduler)
///         .build();
///
///     // Blocks until SIGINT/SIGTERM or the first start error
///     orchestrator.serve().await
/// }
/// ```
pub struct Orchestrator {
    services: Vec<Arc<dyn Service>>,
    signals: Vec<Signal>,
    shutdown_timeout: Option<Duration>,
    logger: Arc<dyn Logger>,
    trigger_tx: mpsc::Sender<StopTrigger>,
    trigger_rx: Mutex<mpsc::Receiver<StopTrigger>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create an orchestrator with default settings
    pub fn new() -> Self {
        OrchestratorBuilder::new().build()
    }

    /// Create a new orchestrator builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub(crate) fn from_parts(
        services: Vec<Arc<dyn Service>>,
        signals: Vec<Signal>,
        shutdown_timeout: Option<Duration>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            services,
            signals,
            shutdown_timeout,
            logger,
            trigger_tx,
            trigger_rx: Mutex::new(trigger_rx),
        }
    }

    /// Add a service; must happen before [`serve`](Self::serve)
    pub fn register<S>(&mut self, service: S) -> &mut Self
    where
        S: Service + 'static,
    {
        self.services.push(Arc::new(service));
        self
    }

    /// Add a service that is also held elsewhere
    pub fn register_shared(&mut self, service: Arc<dyn Service>) -> &mut Self {
        self.services.push(service);
        self
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Advisory deadline handed to each stop call, `None` when unbounded
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }

    /// Request shutdown
    ///
    /// May be called before `serve`; the request is buffered. The buffer
    /// holds one trigger, so this suspends while another is still pending.
    pub async fn stop(&self) {
        self.stop_handle().stop().await;
    }

    /// Cloneable handle that requests shutdown of this orchestrator
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Run every service until a stop trigger or the first start error
    ///
    /// Returns the first start error, or `Ok(())` when shutdown was triggered
    /// by a signal or a stop request. Returns only after every service's
    /// `stop` has returned.
    ///
    /// Stop triggers that arrive after shutdown has begun, including one
    /// left pending when a start error ends the run, are consumed by this
    /// call and do not carry over to the next `serve`.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::NoServices`] when nothing is registered
    /// - [`LifecycleError::AlreadyServing`] when called concurrently
    /// - [`LifecycleError::SignalInstall`] when a signal handler can't be set up
    /// - [`LifecycleError::StartFailed`] / [`LifecycleError::StartPanicked`]
    ///   for the first service that failed to start
    pub async fn serve(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(LifecycleError::NoServices);
        }

        let mut triggers = self
            .trigger_rx
            .try_lock()
            .map_err(|_| LifecycleError::AlreadyServing)?;
        let listener = SignalListener::install(&self.signals, &self.trigger_tx)?;

        let count = self.services.len();
        self.logger.info("starting services", &[("services", &count)]);

        let cancel = CancellationToken::new();
        let (errors, mut first_error) = mpsc::channel(1);
        let shared = Shared {
            cancel: cancel.clone(),
            errors,
            shutdown_timeout: self.shutdown_timeout,
            logger: Arc::clone(&self.logger),
        };

        let mut supervisors = JoinSet::new();
        for service in &self.services {
            supervisors.spawn(supervisor::supervise(Arc::clone(service), shared.clone()));
        }
        drop(shared);

        let outcome = tokio::select! {
            Some(err) = first_error.recv() => {
                let service = err.service().unwrap_or_default().to_owned();
                self.logger.error(
                    "service failed to start",
                    &[("service", &service), ("error", &err)],
                );
                Err(err)
            }
            Some(trigger) = triggers.recv() => {
                self.logger.info("received stop trigger", &[("trigger", &trigger)]);
                Ok(())
            }
            else => Ok(()),
        };

        cancel.cancel();
        self.logger.info("waiting for services to stop", &[("services", &count)]);

        while let Some(joined) = supervisors.join_next().await {
            if let Err(err) = joined {
                self.logger
                    .error("service supervisor aborted", &[("error", &err)]);
            }
        }

        drop(listener);
        while triggers.try_recv().is_ok() {}

        self.logger.info("all services stopped", &[]);
        outcome
    }
}

/// Requests shutdown of the orchestrator it came from
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: mpsc::Sender<StopTrigger>,
}

impl StopHandle {
    /// Request shutdown, suspending while another request is pending
    pub async fn stop(&self) {
        if self.tx.send(StopTrigger::Requested).await.is_err() {
            tracing::debug!("orchestrator dropped before stop request");
        }
    }

    /// Request shutdown without suspending
    ///
    /// Returns `false` when a stop trigger is already pending.
    pub fn try_stop(&self) -> bool {
        self.tx.try_send(StopTrigger::Requested).is_ok()
    }
}
