//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`metrics`]: request and error counters through the `metrics` facade.
//! - [`dev_errors`]: attaches internal error causes as `stack` in
//!   development mode.

pub mod dev_errors;
pub mod metrics;
pub mod tracing_layer;
