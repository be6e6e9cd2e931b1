// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The global subscriber can only be installed once per process, so the
//! whole lifecycle is exercised by a single test.

use mpbridge_core::config::Severity;
use mpbridge_core::{BridgeError, LoggingConfig, ReturnCode, guard_exceptions, logging, throw};

#[test]
fn file_logging_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    logging::configure(|config| {
        config.log_dir = Some(log_dir.clone());
        config.min_log_level = Severity::Info;
    });
    assert_eq!(logging::pending_config().log_dir, Some(log_dir.clone()));
    assert!(!logging::is_initialized());

    logging::init_pending("bridge-test").unwrap();
    assert!(logging::is_initialized());

    // Second init is a no-op.
    logging::init("bridge-test", &LoggingConfig::default()).unwrap();

    logging::log(Severity::Warning, "disk nearly full");
    let code = guard_exceptions("test_logged_failure", || throw("graph config invalid"));
    assert_eq!(code, ReturnCode::StandardError);

    // Visible after a flush, before shutdown.
    logging::flush();
    let log_file = log_dir.join("bridge-test.log");
    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("disk nearly full"));
    assert!(contents.contains("graph config invalid"));
    assert!(contents.contains("test_logged_failure"));

    logging::shutdown();
    assert!(!logging::is_initialized());

    logging::log(Severity::Warning, "after shutdown");
    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(!contents.contains("after shutdown"));

    assert!(matches!(
        logging::init_pending("bridge-test"),
        Err(BridgeError::Logging(_))
    ));
}
