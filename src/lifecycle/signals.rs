//! Stop triggers: OS signals and programmatic stop requests.

use crate::error::{LifecycleError, Result};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Process signal that can trigger shutdown
///
/// Names are lowercase (`"terminate"`) when written and accepted in any case
/// when parsed, through both `FromStr` and serde.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
    /// SIGQUIT
    Quit,
    /// SIGUSR1
    User1,
    /// SIGUSR2
    User2,
}

impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| de::Error::unknown_variant(&name, Signal::VARIANTS))
    }
}

impl Signal {
    /// Signals that stop the orchestrator unless configured otherwise
    pub const DEFAULT: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

/// What started a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTrigger {
    Signal(Signal),
    /// [`Orchestrator::stop`](super::Orchestrator::stop) or a [`StopHandle`](super::StopHandle)
    Requested,
}

impl fmt::Display for StopTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopTrigger::Signal(signal) => fmt::Display::fmt(signal, f),
            StopTrigger::Requested => f.write_str("stop requested"),
        }
    }
}

/// Forwards configured signals into the trigger channel until dropped
///
/// Forwarding uses a non-blocking send: when a trigger is already pending
/// the extra signal is dropped.
pub(crate) struct SignalListener {
    tasks: Vec<JoinHandle<()>>,
}

impl SignalListener {
    pub(crate) fn install(signals: &[Signal], tx: &mpsc::Sender<StopTrigger>) -> Result<Self> {
        let mut listener = Self {
            tasks: Vec::with_capacity(signals.len()),
        };

        for (i, &signal) in signals.iter().enumerate() {
            if signals[..i].contains(&signal) {
                continue;
            }
            let task = forward(signal, tx.clone())?;
            listener.tasks.push(task);
        }

        Ok(listener)
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(unix)]
fn forward(signal: Signal, tx: mpsc::Sender<StopTrigger>) -> Result<JoinHandle<()>> {
    let mut stream = tokio::signal::unix::signal(signal.kind())
        .map_err(|source| LifecycleError::SignalInstall { signal, source })?;

    Ok(tokio::spawn(async move {
        while stream.recv().await.is_some() {
            tracing::debug!(%signal, "signal received");
            if tx.try_send(StopTrigger::Signal(signal)).is_err() {
                tracing::debug!(%signal, "stop trigger already pending");
            }
        }
    }))
}

#[cfg(not(unix))]
fn forward(signal: Signal, tx: mpsc::Sender<StopTrigger>) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        match signal {
            Signal::Interrupt => {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if tx.try_send(StopTrigger::Signal(signal)).is_err() {
                        tracing::debug!(%signal, "stop trigger already pending");
                    }
                }
            }
            _ => std::future::pending::<()>().await,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn signals_parse_case_insensitively() {
        assert_eq!(Signal::from_str("interrupt").unwrap(), Signal::Interrupt);
        assert_eq!(Signal::from_str("TERMINATE").unwrap(), Signal::Terminate);
        assert_eq!(Signal::from_str("User1").unwrap(), Signal::User1);
        assert!(Signal::from_str("sigkill").is_err());
    }

    #[test]
    fn triggers_display_their_identity() {
        assert_eq!(StopTrigger::Signal(Signal::Hangup).to_string(), "hangup");
        assert_eq!(StopTrigger::Requested.to_string(), "stop requested");
    }

    #[tokio::test]
    async fn listener_tasks_are_aborted_on_drop() {
        let (tx, _rx) = mpsc::channel(1);
        let listener =
            SignalListener::install(&[Signal::User2, Signal::User2, Signal::Hangup], &tx).unwrap();
        assert_eq!(listener.tasks.len(), 2);

        let handles: Vec<_> = listener.tasks.iter().map(|t| t.abort_handle()).collect();
        drop(listener);
        tokio::task::yield_now().await;
        for handle in handles {
            for _ in 0..10 {
                if handle.is_finished() {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            assert!(handle.is_finished());
        }
    }
}
