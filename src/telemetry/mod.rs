//! Telemetry for the swap core.
//!
//! Structured logging goes through the `tracing` facade; swap traffic
//! counters are emitted through the `metrics` facade directly from the
//! device hot paths.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
