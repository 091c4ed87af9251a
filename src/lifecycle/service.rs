//! The service capability
//!
//! Anything the orchestrator runs implements [`Service`]. Concrete servers,
//! schedulers and workers are bridged in through the adapters in
//! [`crate::adapter`] or by implementing the trait directly.

use super::ShutdownScope;
use crate::error::ServiceError;
use async_trait::async_trait;

/// A long-running unit with a start and a deadline-bounded stop
///
/// `start` is called once per [`serve`](super::Orchestrator::serve) on its own
/// task and may run until the service is stopped. `stop` is called once
/// shutdown begins, on another task, while `start` may still be running;
/// both therefore take `&self`.
///
/// # Example
///
/// ```rust,ignore
/// use overseer::{Service, ServiceError, ShutdownScope};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// struct Ticker {
///     stopped: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Service for Ticker {
///     async fn start(&self) -> Result<(), ServiceError> {
///         let mut interval = tokio::time::interval(Duration::from_secs(1));
///         loop {
///             tokio::select! {
///                 _ = interval.tick() => tracing::info!("tick"),
///                 _ = self.stopped.cancelled() => return Ok(()),
///             }
///         }
///     }
///
///     async fn stop(&self, _scope: ShutdownScope) -> Result<(), ServiceError> {
///         self.stopped.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync {
    /// Run the service
    ///
    /// An error returned here while no shutdown is underway stops every
    /// registered service and becomes the result of `serve`.
    async fn start(&self) -> Result<(), ServiceError>;

    /// Stop the service, ideally before `scope` expires
    ///
    /// Errors are logged by the orchestrator and otherwise ignored.
    async fn stop(&self, scope: ShutdownScope) -> Result<(), ServiceError>;

    /// Name used in log context and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
