//! Test doubles for overseer
//!
//! [`MockService`] follows a scripted start and stop behaviour and records
//! how it was driven. [`RecordingLogger`] keeps every record it receives.

use async_trait::async_trait;
use overseer::{Field, Logger, Service, ServiceError, ShutdownScope};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What [`MockService::start`](Service::start) does
#[derive(Debug, Clone)]
pub enum StartBehavior {
    /// Never returns
    Block,
    /// Returns once the service is stopped
    UntilStopped,
    /// Returns `Ok(())` immediately
    Succeed,
    /// Returns an error with this message immediately
    Fail(String),
    /// Waits, then returns an error with this message
    FailAfter(Duration, String),
    /// Panics
    Panic,
}

/// What [`MockService::stop`](Service::stop) does
#[derive(Debug, Clone)]
pub enum StopBehavior {
    /// Returns `Ok(())` immediately
    Succeed,
    /// Returns an error with this message
    Fail(String),
    /// Sleeps for the full duration, ignoring the scope
    Sleep(Duration),
    /// Sleeps for the duration unless the scope runs out first
    HonorScope(Duration),
}

/// Shared record of how a [`MockService`] was driven
#[derive(Debug, Default)]
pub struct Calls {
    starts: AtomicUsize,
    stops: AtomicUsize,
    stopped: CancellationToken,
    stop_budgets: Mutex<Vec<Option<Duration>>>,
}

impl Calls {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Time each stop call had left on its scope when it was entered
    pub fn stop_budgets(&self) -> Vec<Option<Duration>> {
        lock(&self.stop_budgets).clone()
    }

    /// Resolves once stop has been called
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }
}

/// Order in which services across a test were stopped
#[derive(Debug, Clone, Default)]
pub struct StopLog(Arc<Mutex<Vec<String>>>);

impl StopLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    fn push(&self, name: &str) {
        lock(&self.0).push(name.to_owned());
    }
}

/// A [`Service`] with scripted behaviour
#[derive(Debug, Clone)]
pub struct MockService {
    name: String,
    start: StartBehavior,
    stop: StopBehavior,
    calls: Arc<Calls>,
    log: Option<StopLog>,
}

impl MockService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: StartBehavior::Block,
            stop: StopBehavior::Succeed,
            calls: Arc::new(Calls::default()),
            log: None,
        }
    }

    pub fn on_start(mut self, behavior: StartBehavior) -> Self {
        self.start = behavior;
        self
    }

    pub fn on_stop(mut self, behavior: StopBehavior) -> Self {
        self.stop = behavior;
        self
    }

    pub fn log_stops_to(mut self, log: &StopLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Service for MockService {
    async fn start(&self) -> Result<(), ServiceError> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        match &self.start {
            StartBehavior::Block => std::future::pending().await,
            StartBehavior::UntilStopped => {
                self.calls.stopped.cancelled().await;
                Ok(())
            }
            StartBehavior::Succeed => Ok(()),
            StartBehavior::Fail(message) => Err(anyhow::anyhow!("{message}")),
            StartBehavior::FailAfter(delay, message) => {
                tokio::time::sleep(*delay).await;
                Err(anyhow::anyhow!("{message}"))
            }
            StartBehavior::Panic => panic!("{} panicked in start", self.name),
        }
    }

    async fn stop(&self, scope: ShutdownScope) -> Result<(), ServiceError> {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
        lock(&self.calls.stop_budgets).push(scope.remaining());
        self.calls.stopped.cancel();

        let result = match &self.stop {
            StopBehavior::Succeed => Ok(()),
            StopBehavior::Fail(message) => Err(anyhow::anyhow!("{message}")),
            StopBehavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            StopBehavior::HonorScope(duration) => scope
                .run(tokio::time::sleep(*duration))
                .await
                .map_err(ServiceError::from),
        };

        if let Some(log) = &self.log {
            log.push(&self.name);
        }
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Level a [`Record`] was logged at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logged through [`Logger::info`]
    Info,
    /// Logged through [`Logger::error`]
    Error,
}

/// One call made to a [`RecordingLogger`]
#[derive(Debug, Clone)]
pub struct Record {
    /// Level the message was logged at
    pub level: Level,
    /// The message text
    pub message: String,
    /// Context pairs, values rendered with `Display`
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Rendered value of the first field named `key`
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A [`Logger`] that keeps every record
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<Record>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        lock(&self.records).clone()
    }

    /// First record with this level and message
    pub fn find(&self, level: Level, message: &str) -> Option<Record> {
        lock(&self.records)
            .iter()
            .find(|r| r.level == level && r.message == message)
            .cloned()
    }

    pub fn count(&self, level: Level, message: &str) -> usize {
        lock(&self.records)
            .iter()
            .filter(|r| r.level == level && r.message == message)
            .count()
    }

    fn push(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let fields = fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.to_string()))
            .collect();
        lock(&self.records).push(Record {
            level,
            message: message.to_owned(),
            fields,
        });
    }
}

impl Logger for RecordingLogger {
    fn info(&self, msg: &str, fields: &[Field<'_>]) {
        self.push(Level::Info, msg, fields);
    }

    fn error(&self, msg: &str, fields: &[Field<'_>]) {
        self.push(Level::Error, msg, fields);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
