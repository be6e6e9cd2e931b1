// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The pending logging config is seeded once per process, so this binary
//! holds a single test.

use serial_test::serial;

use mpbridge_core::config::Severity;
use mpbridge_core::{LoggingConfig, logging};

#[test]
#[serial]
fn pending_config_starts_from_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(LoggingConfig::FILE_NAME),
        "min_log_level: warning\nverbosity: 1\n",
    )
    .unwrap();

    // SAFETY: the only test in this binary; nothing reads the environment
    // concurrently.
    unsafe {
        std::env::set_var("MPBRIDGE_CONFIG_DIR", dir.path());
        std::env::set_var("MPBRIDGE_STDERR_THRESHOLD", "info");
    }

    let config = logging::pending_config();
    assert_eq!(config.min_log_level, Severity::Warning);
    assert_eq!(config.verbosity, 1);
    assert_eq!(config.stderr_threshold, Severity::Info);

    // Setters apply on top of the seeded values.
    logging::configure(|config| config.verbosity = 0);
    let config = logging::pending_config();
    assert_eq!(config.verbosity, 0);
    assert_eq!(config.min_log_level, Severity::Warning);
}
