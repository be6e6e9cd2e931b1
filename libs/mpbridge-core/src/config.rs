// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Logging configuration via `mpbridge.yaml` and `MPBRIDGE_*` variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Log severity of the wrapped library, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info = 0,
    Warning = 1,
    Error = 2,
    Fatal = 3,
}

impl Severity {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Info),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            3 => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn level(self) -> tracing::Level {
        match self {
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Fatal => tracing::Level::ERROR,
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "0" | "info" => Some(Self::Info),
            "1" | "warning" | "warn" => Some(Self::Warning),
            "2" | "error" => Some(Self::Error),
            "3" | "fatal" => Some(Self::Fatal),
            _ => None,
        }
    }
}

/// Where diagnostics go and how much of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Send every event to stderr regardless of `stderr_threshold`.
    pub log_to_stderr: bool,
    /// Events at or above this severity go to stderr.
    pub stderr_threshold: Severity,
    /// Events below this severity are dropped.
    pub min_log_level: Severity,
    /// Directory for `<program>.log`. No file output when unset.
    pub log_dir: Option<PathBuf>,
    /// Verbose logging: 1 enables debug events, 2 and above trace events.
    pub verbosity: i32,
}

impl LoggingConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "mpbridge.yaml";

    pub const DEFAULT: LoggingConfig = LoggingConfig {
        log_to_stderr: false,
        stderr_threshold: Severity::Error,
        min_log_level: Severity::Info,
        log_dir: None,
        verbosity: 0,
    };

    /// Load configuration from a directory. Returns error if the file is
    /// missing or cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            BridgeError::Configuration(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            BridgeError::Configuration(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        tracing::info!("Loaded logging config from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration from a directory, returning defaults if the file
    /// is missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default();
        }

        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// The configuration the bridge starts from: `mpbridge.yaml` in
    /// `MPBRIDGE_CONFIG_DIR` (or the current directory) with the
    /// environment overrides applied. Invalid overrides are logged and
    /// skipped.
    pub fn discover() -> Self {
        let dir = std::env::var_os("MPBRIDGE_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();

        let config = Self::load_or_default(&dir);
        match config.clone().with_env_overrides() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                config
            }
        }
    }

    /// Applies `MPBRIDGE_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup("MPBRIDGE_LOG_DIR") {
            self.log_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(value) = lookup("MPBRIDGE_LOGTOSTDERR") {
            self.log_to_stderr = parse_flag("MPBRIDGE_LOGTOSTDERR", &value)?;
        }
        if let Some(value) = lookup("MPBRIDGE_STDERR_THRESHOLD") {
            self.stderr_threshold = parse_severity("MPBRIDGE_STDERR_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("MPBRIDGE_MIN_LOG_LEVEL") {
            self.min_log_level = parse_severity("MPBRIDGE_MIN_LOG_LEVEL", &value)?;
        }
        if let Some(value) = lookup("MPBRIDGE_VERBOSITY") {
            self.verbosity = value.trim().parse().map_err(|_| {
                BridgeError::Configuration(format!("MPBRIDGE_VERBOSITY: not an integer: {}", value))
            })?;
        }
        Ok(self)
    }

    /// Most verbose level that passes the filter.
    pub fn max_level(&self) -> tracing::Level {
        match self.verbosity {
            v if v > 1 => tracing::Level::TRACE,
            1 => tracing::Level::DEBUG,
            _ => self.min_log_level.level(),
        }
    }

    /// Most verbose level written to stderr.
    pub fn stderr_level(&self) -> tracing::Level {
        if self.log_to_stderr {
            tracing::Level::TRACE
        } else {
            self.stderr_threshold.level()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(BridgeError::Configuration(format!(
            "{}: not a boolean: {}",
            key, value
        ))),
    }
}

fn parse_severity(key: &str, value: &str) -> Result<Severity> {
    Severity::parse(value).ok_or_else(|| {
        BridgeError::Configuration(format!("{}: unknown severity: {}", key, value))
    })
}
