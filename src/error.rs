use crate::lifecycle::Signal;
use thiserror::Error;

/// Error type returned by service bodies.
///
/// Services report failures as `anyhow::Error` so their own `?` chains keep
/// working; the orchestrator only ever wraps or logs them.
pub type ServiceError = anyhow::Error;

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors raised by the orchestrator and by shutdown scopes
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `serve` was called with nothing registered
    #[error("no services registered")]
    NoServices,

    /// Another `serve` on the same orchestrator has not returned yet
    #[error("orchestrator is already serving")]
    AlreadyServing,

    /// A stop signal handler could not be registered
    #[error("failed to install {signal} handler: {source}")]
    SignalInstall {
        /// Signal whose handler failed
        signal: Signal,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A service returned an error from `start`
    #[error("service {service} failed to start: {source}")]
    StartFailed {
        /// Name of the service that failed
        service: String,
        /// Error returned by the service
        #[source]
        source: ServiceError,
    },

    /// A service panicked inside `start`
    #[error("service {service} panicked while starting")]
    StartPanicked {
        /// Name of the service that panicked
        service: String,
    },

    /// A shutdown scope reached its deadline
    #[error("shutdown deadline exceeded")]
    DeadlineExceeded,

    /// A shutdown scope without deadline was cancelled
    #[error("shutdown scope cancelled")]
    ScopeCancelled,
}

impl LifecycleError {
    /// Create a start failure for the named service
    pub fn start_failed(service: impl Into<String>, source: impl Into<ServiceError>) -> Self {
        Self::StartFailed {
            service: service.into(),
            source: source.into(),
        }
    }

    /// Create a start panic error for the named service
    pub fn start_panicked(service: impl Into<String>) -> Self {
        Self::StartPanicked {
            service: service.into(),
        }
    }

    /// Name of the service that caused the error, if any
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::StartFailed { service, .. } | Self::StartPanicked { service } => Some(service),
            _ => None,
        }
    }

    /// Whether the error came from a shutdown scope running out
    pub fn is_scope_expired(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::ScopeCancelled)
    }
}
