//! Adapters that bridge concrete service APIs into [`Service`](crate::Service).

mod func;
mod http;
mod listener;

pub use func::FnService;
pub use http::HttpListener;
pub use listener::{Listener, ListenerClosed, ListenerService};
