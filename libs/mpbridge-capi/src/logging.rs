// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host control of the library's logging.
//!
//! The setters edit the pending configuration and only take effect at
//! `mp_Logging__Initialize`. Severities are `0` info, `1` warning, `2`
//! error and `3` fatal.

use std::ffi::{c_char, c_int};
use std::path::PathBuf;

use mpbridge_core::config::Severity;
use mpbridge_core::{ReturnCode, guard_all, guard_exceptions, logging, marshal, native_bail};

fn severity(raw: c_int) -> Severity {
    match Severity::from_raw(raw) {
        Some(severity) => severity,
        None => native_bail!("unknown log severity {}", raw),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__SetLogToStderr(value: bool) -> ReturnCode {
    guard_exceptions("mp_Logging__SetLogToStderr", || {
        logging::configure(|config| config.log_to_stderr = value);
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__SetStderrThreshold(threshold: c_int) -> ReturnCode {
    guard_exceptions("mp_Logging__SetStderrThreshold", || {
        let threshold = severity(threshold);
        logging::configure(|config| config.stderr_threshold = threshold);
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__SetMinLogLevel(level: c_int) -> ReturnCode {
    guard_exceptions("mp_Logging__SetMinLogLevel", || {
        let level = severity(level);
        logging::configure(|config| config.min_log_level = level);
    })
}

/// Null disables the log file.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__SetLogDir(dir: *const c_char) -> ReturnCode {
    guard_exceptions("mp_Logging__SetLogDir", || {
        let dir = unsafe { marshal::read_str(dir) }.map(PathBuf::from);
        logging::configure(|config| config.log_dir = dir);
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__SetVerbosity(verbosity: c_int) -> ReturnCode {
    guard_exceptions("mp_Logging__SetVerbosity", || {
        logging::configure(|config| config.verbosity = verbosity);
    })
}

/// Installs the subscriber. Fails after `mp_Logging__Shutdown`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__Initialize(program: *const c_char) -> ReturnCode {
    guard_exceptions("mp_Logging__Initialize", || {
        let program = unsafe { marshal::require_str(program, "program") };
        if let Err(e) = logging::init_pending(program) {
            native_bail!("{}", e);
        }
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__Shutdown() -> ReturnCode {
    guard_exceptions("mp_Logging__Shutdown", logging::shutdown)
}

/// Severity `3` aborts after logging and reports `Aborted`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__Log(severity_raw: c_int, message: *const c_char) -> ReturnCode {
    guard_all("mp_Logging__Log", || {
        let severity = severity(severity_raw);
        let message = unsafe { marshal::read_str(message) }.unwrap_or_default();
        logging::log(severity, message);
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Logging__Flush() -> ReturnCode {
    guard_exceptions("mp_Logging__Flush", logging::flush)
}
