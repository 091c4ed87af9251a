use crate::lifecycle::Signal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator settings as plain data
///
/// Meant to be embedded in a host application's own config file; the
/// orchestrator never reads files or the environment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Signals that begin shutdown
    pub stop_signals: Vec<Signal>,
    /// Deadline handed to each stop call, 0 = unbounded
    pub shutdown_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stop_signals: Signal::DEFAULT.to_vec(),
            shutdown_timeout_ms: 0,
        }
    }
}

impl OrchestratorConfig {
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        (self.shutdown_timeout_ms > 0).then(|| Duration::from_millis(self.shutdown_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.stop_signals, vec![Signal::Interrupt, Signal::Terminate]);
        assert_eq!(config.shutdown_timeout(), None);
    }

    #[test]
    fn parses_signal_names_and_timeout() {
        let config: OrchestratorConfig = serde_json::from_str(
            r#"{ "stop_signals": ["terminate", "hangup"], "shutdown_timeout_ms": 30000 }"#,
        )
        .unwrap();
        assert_eq!(config.stop_signals, vec![Signal::Terminate, Signal::Hangup]);
        assert_eq!(config.shutdown_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn signal_names_ignore_case() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{ "stop_signals": ["TERMINATE", "Hangup"] }"#).unwrap();
        assert_eq!(config.stop_signals, vec![Signal::Terminate, Signal::Hangup]);

        let written = serde_json::to_string(&config).unwrap();
        assert!(written.contains(r#"["terminate","hangup"]"#), "{written}");
    }

    #[test]
    fn rejects_unknown_signal() {
        let result = serde_json::from_str::<OrchestratorConfig>(r#"{ "stop_signals": ["kill"] }"#);
        assert!(result.is_err());
    }
}
