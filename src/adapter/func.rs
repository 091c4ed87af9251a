use crate::error::ServiceError;
use crate::lifecycle::{Service, ShutdownScope};
use async_trait::async_trait;
use std::borrow::Cow;
use std::future::Future;

/// A [`Service`] made of two plain async functions
///
/// `start` runs until told to stop; `stop` tells it to, ideally within the
/// scope's deadline. Nothing is added on top of the two functions.
///
/// # Example
///
/// ```rust,ignore
/// use overseer::FnService;
/// use tokio_util::sync::CancellationToken;
///
/// let stopped = CancellationToken::new();
/// let token = stopped.clone();
/// let worker = FnService::new(
///     move || {
///         let token = token.clone();
///         async move {
///             token.cancelled().await;
///             Ok(())
///         }
///     },
///     move |_scope| {
///         let stopped = stopped.clone();
///         async move {
///             stopped.cancel();
///             Ok(())
///         }
///     },
/// )
/// .named("worker");
/// ```
pub struct FnService<S, T> {
    name: Cow<'static, str>,
    start: S,
    stop: T,
}

impl<S, SF, T, TF> FnService<S, T>
where
    S: Fn() -> SF + Send + Sync,
    SF: Future<Output = Result<(), ServiceError>> + Send + 'static,
    T: Fn(ShutdownScope) -> TF + Send + Sync,
    TF: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    pub fn new(start: S, stop: T) -> Self {
        Self {
            name: Cow::Borrowed("fn-service"),
            start,
            stop,
        }
    }
}

impl<S, T> FnService<S, T> {
    /// Set the name used in logs and errors
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<S, SF, T, TF> Service for FnService<S, T>
where
    S: Fn() -> SF + Send + Sync,
    SF: Future<Output = Result<(), ServiceError>> + Send + 'static,
    T: Fn(ShutdownScope) -> TF + Send + Sync,
    TF: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    async fn start(&self) -> Result<(), ServiceError> {
        (self.start)().await
    }

    async fn stop(&self, scope: ShutdownScope) -> Result<(), ServiceError> {
        (self.stop)(scope).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
