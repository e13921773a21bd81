//! Sortwatch service library
//!
//! HTTP router, shared state and Prometheus exporter behind the `sortwatch`
//! binary. Exposed as a library so the router can be driven in tests.

pub mod metrics;
pub mod server;

pub use server::{router, serve, ApiError, AppState};
