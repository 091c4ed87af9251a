//! Two-level logging sink used by the orchestrator.
//!
//! The orchestrator never formats or persists anything itself; it hands a
//! message and a set of key/value pairs to whatever [`Logger`] it was built
//! with. The default is [`NopLogger`]. [`TracingLogger`] forwards to the
//! `tracing` ecosystem.

use std::fmt;

/// A single key/value pair of log context
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Info/error sink consumed by the orchestrator
///
/// Implementations must not panic; there is no way to report a logging
/// failure back to the caller.
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, fields: &[Field<'_>]);

    fn error(&self, msg: &str, fields: &[Field<'_>]);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl Logger for NopLogger {
    fn info(&self, _msg: &str, _fields: &[Field<'_>]) {}

    fn error(&self, _msg: &str, _fields: &[Field<'_>]) {}
}

/// Forwards to `tracing` under the `overseer` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, fields: &[Field<'_>]) {
        tracing::info!(target: "overseer", context = %Fields(fields), "{}", msg);
    }

    fn error(&self, msg: &str, fields: &[Field<'_>]) {
        tracing::error!(target: "overseer", context = %Fields(fields), "{}", msg);
    }
}

/// Renders fields as `key=value` pairs separated by spaces
pub struct Fields<'a>(pub &'a [Field<'a>]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
