//! # Observability
//!
//! Structured logging for the engine and the CLI via `tracing`. The engine
//! emits `debug!` events for sizing decisions and `warn!` when the
//! transform size cannot hold the linear result; the CLI reports stage
//! timings at `info`.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
