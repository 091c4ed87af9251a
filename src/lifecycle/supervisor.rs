//! Per-service lifecycle driver.

use super::{Service, ShutdownScope};
use crate::error::LifecycleError;
use crate::logger::Logger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything a supervisor shares with the other supervisors of one `serve`
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) cancel: CancellationToken,
    pub(crate) errors: mpsc::Sender<LifecycleError>,
    pub(crate) shutdown_timeout: Option<Duration>,
    pub(crate) logger: Arc<dyn Logger>,
}

/// Start `service` on its own task, wait for cancellation, then stop it
///
/// A start error is offered to the error funnel unless shutdown has already
/// begun, in which case it is dropped. The start task is not joined.
pub(crate) async fn supervise(service: Arc<dyn Service>, shared: Shared) {
    let Shared {
        cancel,
        errors,
        shutdown_timeout,
        logger,
    } = shared;
    let name = service.name().to_owned();

    let mut start = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.start().await }
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        joined = &mut start => {
            let failure = match joined {
                Ok(Ok(())) => {
                    tracing::debug!(service = %name, "start returned");
                    None
                }
                Ok(Err(source)) => Some(LifecycleError::start_failed(&name, source)),
                Err(join_error) if join_error.is_panic() => {
                    Some(LifecycleError::start_panicked(&name))
                }
                Err(_) => None,
            };

            if let Some(err) = failure {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(service = %name, "start error dropped, shutdown already underway");
                    }
                    sent = errors.send(err) => {
                        if sent.is_err() {
                            tracing::debug!(service = %name, "error funnel closed");
                        }
                    }
                }
            }
            cancel.cancelled().await;
        }
    }
    drop(errors);

    let scope = ShutdownScope::from_timeout(shutdown_timeout);
    let _guard = scope.token().clone().drop_guard();

    if let Err(err) = service.stop(scope).await {
        logger.error(
            "service failed to stop",
            &[("service", &name), ("error", &err)],
        );
    }
    tracing::debug!(service = %name, "supervisor finished");
}
