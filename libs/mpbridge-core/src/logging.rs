// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Process-wide `tracing` subscriber for the cdylib.
//!
//! The host has no Rust subscriber, so nothing is recorded until
//! [`init`] installs one. Settings accumulate in a pending
//! [`LoggingConfig`] and are applied at init time. The pending config is
//! seeded once from [`LoggingConfig::discover`]; [`configure`] edits it
//! from there.

use std::io::{self, Write};
use std::panic;
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, Once, RwLock};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

use crate::config::{LoggingConfig, Severity};
use crate::error::{BridgeError, Result};
use crate::translate::NativeException;

static PENDING: RwLock<LoggingConfig> = parking_lot::const_rwlock(LoggingConfig::DEFAULT);
static SEED: Once = Once::new();
static STATE: Mutex<LoggingState> = parking_lot::const_mutex(LoggingState::Uninitialized);
static PANIC_HOOK: Once = Once::new();

enum LoggingState {
    Uninitialized,
    Running {
        program: String,
        file: Option<LogFile>,
    },
    ShutDown,
}

fn pending() -> &'static RwLock<LoggingConfig> {
    SEED.call_once(|| *PENDING.write() = LoggingConfig::discover());
    &PENDING
}

/// Edits the configuration [`init_pending`] will use.
pub fn configure(f: impl FnOnce(&mut LoggingConfig)) {
    f(&mut pending().write());
}

pub fn pending_config() -> LoggingConfig {
    pending().read().clone()
}

pub fn is_initialized() -> bool {
    matches!(*STATE.lock(), LoggingState::Running { .. })
}

/// [`init`] with the pending configuration.
pub fn init_pending(program: &str) -> Result<()> {
    let config = pending_config();
    init(program, &config)
}

/// Installs the global subscriber: stderr for events at or above the
/// stderr threshold, plus `<log_dir>/<program>.log` when a directory is set.
/// `RUST_LOG` overrides the configured level filter.
///
/// Calling it again after success is a no-op.
pub fn init(program: &str, config: &LoggingConfig) -> Result<()> {
    let mut state = STATE.lock();
    match &*state {
        LoggingState::Running { program: running, .. } => {
            tracing::debug!(program, running = %running, "Logging already initialized");
            return Ok(());
        }
        LoggingState::ShutDown => {
            return Err(BridgeError::Logging(
                "logging was shut down and cannot be re-initialized".to_string(),
            ));
        }
        LoggingState::Uninitialized => {}
    }

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(config.max_level().as_str().to_ascii_lowercase())
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from_level(config.stderr_level()));

    let file = match &config.log_dir {
        Some(dir) => Some(LogFile::create(dir, program)?),
        None => None,
    };
    let file_layer = file.clone().map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BridgeError::Logging(e.to_string()))?;

    install_panic_hook();

    *state = LoggingState::Running {
        program: program.to_string(),
        file,
    };
    tracing::info!(program, "Logging initialized");
    Ok(())
}

/// Flushes and closes the log file. Events after this only reach stderr.
pub fn shutdown() {
    let mut state = STATE.lock();
    if let LoggingState::Running { program, file } = &*state {
        tracing::info!(program = %program, "Logging shut down");
        if let Some(file) = file {
            file.close();
        }
    }
    *state = LoggingState::ShutDown;
}

/// Flushes stderr and the log file.
pub fn flush() {
    let _ = io::stderr().flush();
    if let LoggingState::Running {
        file: Some(file), ..
    } = &*STATE.lock()
    {
        if let Err(e) = file.clone().flush() {
            tracing::warn!("Failed to flush log file: {}", e);
        }
    }
}

/// Records `message` at `severity`. [`Severity::Fatal`] aborts the process
/// after logging, like any other fatal check.
pub fn log(severity: Severity, message: &str) {
    match severity {
        Severity::Info => tracing::info!("{}", message),
        Severity::Warning => tracing::warn!("{}", message),
        Severity::Error => tracing::error!("{}", message),
        Severity::Fatal => crate::fatal!("{}", message),
    }
}

// ============================================================================
// Log file
// ============================================================================

/// `<log_dir>/<program>.log`, shared between the subscriber and
/// [`flush`]/[`shutdown`]. Writes after [`LogFile::close`] are dropped.
#[derive(Clone)]
struct LogFile {
    appender: Arc<Mutex<Option<RollingFileAppender>>>,
}

impl LogFile {
    fn create(dir: &std::path::Path, program: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(format!("{}.log", program))
            .build(dir)
            .map_err(|e| BridgeError::Logging(e.to_string()))?;
        Ok(Self {
            appender: Arc::new(Mutex::new(Some(appender))),
        })
    }

    fn close(&self) {
        if let Some(mut appender) = self.appender.lock().take() {
            let _ = appender.flush();
        }
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.appender.lock().as_mut() {
            Some(appender) => appender.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.appender.lock().as_mut() {
            Some(appender) => appender.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ============================================================================
// Panic hook
// ============================================================================

/// Replaces std's stderr panic printer with a debug-level `tracing` event.
/// Boundary calls report the panics they catch themselves; the hook only
/// adds the location. Installed once per process.
pub fn install_panic_hook() {
    // set_hook panics when called during a panic.
    if thread::panicking() {
        return;
    }
    PANIC_HOOK.call_once(|| {
        panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_default();
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .or_else(|| {
                    info.payload()
                        .downcast_ref::<NativeException>()
                        .map(|e| e.message().to_string())
                })
                .unwrap_or_default();
            tracing::debug!(location = %location, "panic: {}", message);
        }));
    });
}

pub fn panic_hook_installed() -> bool {
    PANIC_HOOK.state().done()
}
