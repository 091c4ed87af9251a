//! HTTP listener backed by `axum::serve`.

use super::listener::{Listener, ListenerClosed, ListenerService};
use crate::error::ServiceError;
use crate::lifecycle::ShutdownScope;
use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use std::io;
use std::net::SocketAddr;
use std::mem;
use std::sync::{Mutex, MutexGuard};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

/// Serves an axum [`Router`] until shut down
///
/// `shutdown` stops accepting new connections and waits, within the scope,
/// for in-flight connections to finish.
///
/// The listener is single-use: once it has been shut down the socket is
/// closed, and a later `accept` fails instead of serving again. An
/// orchestrator that is served more than once needs a freshly bound
/// `HttpListener` per run.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{routing::get, Router};
/// use overseer::{HttpListener, Orchestrator};
///
/// let router = Router::new().route("/health", get(|| async { "ok" }));
/// let http = HttpListener::bind("0.0.0.0:8080", router).await?;
///
/// let orchestrator = Orchestrator::builder()
///     .register(http.into_service())
///     .build();
/// ```
pub struct HttpListener {
    socket: Mutex<Socket>,
    router: Router,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    finished: CancellationToken,
}

enum Socket {
    /// Bound, not yet accepting
    Idle(TcpListener),
    Serving,
    /// Shut down before `accept` took the socket
    Released,
    /// Served and shut down, or released and already reported as closed
    Spent,
}

impl HttpListener {
    pub fn new(listener: TcpListener, router: Router) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            socket: Mutex::new(Socket::Idle(listener)),
            router,
            local_addr,
            shutdown: CancellationToken::new(),
            finished: CancellationToken::new(),
        })
    }

    /// Bind a TCP listener and serve `router` on it
    pub async fn bind(addr: impl ToSocketAddrs, router: Router) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Self::new(listener, router)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wrap into a [`Service`](crate::Service) named `http`
    pub fn into_service(self) -> ListenerService<Self> {
        ListenerService::new(self).named("http")
    }

    fn socket(&self) -> Result<MutexGuard<'_, Socket>, ServiceError> {
        self.socket
            .lock()
            .map_err(|_| anyhow!("http listener lock poisoned"))
    }
}

#[async_trait]
impl Listener for HttpListener {
    async fn accept(&self) -> Result<(), ServiceError> {
        let listener = {
            let mut socket = self.socket()?;
            match mem::replace(&mut *socket, Socket::Spent) {
                Socket::Idle(listener) => {
                    *socket = Socket::Serving;
                    listener
                }
                Socket::Released => return Err(ListenerClosed.into()),
                Socket::Serving => {
                    *socket = Socket::Serving;
                    return Err(anyhow!("http listener is already serving"));
                }
                Socket::Spent => {
                    return Err(anyhow!(
                        "http listener on {} was already shut down",
                        self.local_addr
                    ));
                }
            }
        };
        let _finished = self.finished.clone().drop_guard();

        tracing::info!(address = %self.local_addr, "HTTP server starting");
        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        *self.socket()? = Socket::Spent;
        served?;
        tracing::info!(address = %self.local_addr, "HTTP server stopped");

        if self.shutdown.is_cancelled() {
            Err(ListenerClosed.into())
        } else {
            Ok(())
        }
    }

    async fn shutdown(&self, scope: ShutdownScope) -> Result<(), ServiceError> {
        let serving = {
            let mut socket = self.socket()?;
            self.shutdown.cancel();
            match &*socket {
                Socket::Idle(_) => {
                    *socket = Socket::Released;
                    false
                }
                Socket::Serving => true,
                Socket::Released | Socket::Spent => false,
            }
        };
        if !serving {
            return Ok(());
        }

        scope.run(self.finished.cancelled()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use crate::lifecycle::Service;
    use axum::routing::get;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn router() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
    }

    async fn send(addr: SocketAddr, path: &str) -> io::Result<TcpStream> {
        let mut stream = TcpStream::connect(addr).await?;
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await?;
        Ok(stream)
    }

    #[tokio::test]
    async fn serves_requests_until_shut_down() {
        let http = HttpListener::bind("127.0.0.1:0", router()).await.unwrap();
        let addr = http.local_addr();
        let service = Arc::new(http.into_service());
        assert_eq!(service.name(), "http");

        let start = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.start().await }
        });

        let mut stream = send(addr, "/").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("ok"));

        service
            .stop(ShutdownScope::with_timeout(Duration::from_secs(1)))
            .await
            .unwrap();
        start.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_before_accept_releases_the_socket() {
        let http = HttpListener::bind("127.0.0.1:0", router()).await.unwrap();
        let service = http.into_service();

        service.stop(ShutdownScope::unbounded()).await.unwrap();
        service.start().await.unwrap();
    }

    #[tokio::test]
    async fn restart_after_shutdown_is_a_start_error() {
        let http = HttpListener::bind("127.0.0.1:0", router()).await.unwrap();
        let addr = http.local_addr();
        let service = Arc::new(http.into_service());

        let start = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.start().await }
        });
        let mut stream = send(addr, "/").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        service
            .stop(ShutdownScope::with_timeout(Duration::from_secs(1)))
            .await
            .unwrap();
        start.await.unwrap().unwrap();

        let err = service.start().await.unwrap_err();
        assert!(err.to_string().contains("already shut down"), "{err}");
        service.stop(ShutdownScope::unbounded()).await.unwrap();
    }

    #[tokio::test]
    async fn released_socket_reports_closed_only_once() {
        let http = HttpListener::bind("127.0.0.1:0", router()).await.unwrap();
        let service = http.into_service();

        service.stop(ShutdownScope::unbounded()).await.unwrap();
        service.start().await.unwrap();
        assert!(service.start().await.is_err());
    }

    #[tokio::test]
    async fn in_flight_request_past_deadline_is_reported() {
        let http = HttpListener::bind("127.0.0.1:0", router()).await.unwrap();
        let addr = http.local_addr();
        let service = Arc::new(http.into_service());

        let start = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.start().await }
        });

        let _stream = send(addr, "/slow").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = service
            .stop(ShutdownScope::with_timeout(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LifecycleError>(),
            Some(LifecycleError::DeadlineExceeded)
        ));

        start.await.unwrap().unwrap();
    }
}
