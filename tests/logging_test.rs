//! TDD-Light tests for logging initialization.

use swapcore::telemetry::{init_logging, LogConfig, LogError, LogFormat};

#[test]
fn logging_initializes_once_then_reports_already_initialized() {
    let config = LogConfig {
        format: LogFormat::Pretty,
        level: "swapcore=debug".to_string(),
    };

    assert!(init_logging(&config).is_ok());
    assert!(matches!(
        init_logging(&config),
        Err(LogError::AlreadyInitialized)
    ));
}

#[test]
fn logging_rejects_malformed_filters() {
    let config = LogConfig {
        format: LogFormat::Json,
        level: "swapcore==debug==extra".to_string(),
    };

    assert!(matches!(
        init_logging(&config),
        Err(LogError::InvalidFilter(_))
    ));
}
