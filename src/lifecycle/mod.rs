//! Service lifecycle orchestration
//!
//! ```text
//! register(service) ...        (before serve)
//!    ↓
//! serve()
//!    ├─ no services?  → Err(NoServices)
//!    ├─ install stop-signal listener
//!    ├─ spawn one supervisor per service ──→ start() on its own task
//!    ↓
//! race: first start error  |  signal / stop()
//!    ↓
//! cancel all supervisors   ──→ stop(scope) on every service, concurrently
//!    ↓
//! join all supervisors
//!    ↓
//! return first start error, or Ok(())
//! ```
//!
//! There is no ordering between services, no retry and no restart. Stop
//! errors are logged and never change the result of `serve`. The shutdown
//! deadline is advisory: `serve` waits for every `stop` call to return.

mod builder;
mod orchestrator;
mod scope;
mod service;
mod signals;
mod supervisor;

pub use builder::OrchestratorBuilder;
pub use orchestrator::{Orchestrator, StopHandle};
pub use scope::ShutdownScope;
pub use service::Service;
pub use signals::{Signal, StopTrigger};
