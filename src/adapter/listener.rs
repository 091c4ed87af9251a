use crate::error::ServiceError;
use crate::lifecycle::{Service, ShutdownScope};
use async_trait::async_trait;
use std::borrow::Cow;
use thiserror::Error;

/// Returned by [`Listener::accept`] when it ended because of a shutdown
///
/// [`ListenerService`] turns it into a clean start return.
#[derive(Debug, Clone, Copy, Default, Error)]
#[error("listener closed")]
pub struct ListenerClosed;

/// Something that blocks while accepting work, such as a network server
#[async_trait]
pub trait Listener: Send + Sync {
    /// Accept work until shut down or failed
    ///
    /// Should return [`ListenerClosed`] when it ended because `shutdown` was
    /// called.
    async fn accept(&self) -> Result<(), ServiceError>;

    /// Stop accepting and release in-flight work, within the scope
    async fn shutdown(&self, scope: ShutdownScope) -> Result<(), ServiceError>;
}

/// Bridges a [`Listener`] into a [`Service`]
pub struct ListenerService<L> {
    name: Cow<'static, str>,
    listener: L,
}

impl<L> ListenerService<L>
where
    L: Listener,
{
    pub fn new(listener: L) -> Self {
        Self {
            name: Cow::Borrowed("listener"),
            listener,
        }
    }

    /// Set the name used in logs and errors
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }
}

#[async_trait]
impl<L> Service for ListenerService<L>
where
    L: Listener,
{
    async fn start(&self) -> Result<(), ServiceError> {
        match self.listener.accept().await {
            Err(err) if err.is::<ListenerClosed>() => {
                tracing::debug!(service = %self.name, "listener closed by shutdown");
                Ok(())
            }
            result => result,
        }
    }

    async fn stop(&self, scope: ShutdownScope) -> Result<(), ServiceError> {
        self.listener.shutdown(scope).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
