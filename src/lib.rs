//! # Overseer
//!
//! Starts a set of independently implemented long-running services
//! concurrently, waits for a stop signal or the first start error, then
//! stops every service concurrently under an optional shared deadline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use overseer::{FnService, HttpListener, Orchestrator, TracingLogger};
//! use axum::{routing::get, Router};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = Router::new().route("/", get(|| async { "hello" }));
//!     let http = HttpListener::bind("127.0.0.1:3000", router).await?;
//!
//!     let stopped = CancellationToken::new();
//!     let ticker = FnService::new(
//!         {
//!             let stopped = stopped.clone();
//!             move || {
//!                 let stopped = stopped.clone();
//!                 async move {
//!                     stopped.cancelled().await;
//!                     Ok(())
//!                 }
//!             }
//!         },
//!         move |_scope| {
//!             let stopped = stopped.clone();
//!             async move {
//!                 stopped.cancel();
//!                 Ok(())
//!             }
//!         },
//!     )
//!     .named("ticker");
//!
//!     let orchestrator = Orchestrator::builder()
//!         .shutdown_timeout(Duration::from_secs(5))
//!         .logger(TracingLogger)
//!         .register(http.into_service())
//!         .register(ticker)
//!         .build();
//!
//!     orchestrator.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logger;

pub use adapter::{FnService, HttpListener, Listener, ListenerClosed, ListenerService};
pub use config::OrchestratorConfig;
pub use error::{LifecycleError, Result, ServiceError};
pub use lifecycle::{
    Orchestrator, OrchestratorBuilder, Service, ShutdownScope, Signal, StopHandle, StopTrigger,
};
pub use logger::{Field, Logger, NopLogger, TracingLogger};

pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use overseer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::{FnService, HttpListener, Listener, ListenerClosed, ListenerService};
    pub use crate::config::OrchestratorConfig;
    pub use crate::error::{LifecycleError, Result, ServiceError};
    pub use crate::lifecycle::{
        Orchestrator, OrchestratorBuilder, Service, ShutdownScope, Signal, StopHandle,
    };
    pub use crate::logger::{Logger, NopLogger, TracingLogger};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
