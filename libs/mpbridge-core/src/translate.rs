// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Converts panics escaping a unit of work into return codes.
//!
//! Native code signals recoverable failures by panicking with a
//! [`NativeException`] payload (see [`throw`] and [`native_bail!`]). Panics
//! carrying a plain message (`panic!("...")`) are treated the same way. Any
//! other payload is opaque to the boundary and becomes
//! [`ReturnCode::UnknownError`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::ReturnCode;

/// Recoverable failure raised by native code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeException {
    message: String,
}

impl NativeException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NativeException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NativeException {}

/// Raises a [`NativeException`]. Caught by the enclosing boundary call and
/// reported as [`ReturnCode::StandardError`].
pub fn throw(message: impl Into<String>) -> ! {
    panic::panic_any(NativeException::new(message))
}

/// `format!`-style [`throw`].
#[macro_export]
macro_rules! native_bail {
    ($($arg:tt)*) => {
        $crate::translate::throw(::std::format!($($arg)*))
    };
}

/// A panic caught at the boundary, classified by payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caught {
    Standard(String),
    Unknown,
}

impl Caught {
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let caught = if let Some(exception) = payload.downcast_ref::<NativeException>() {
            Caught::Standard(exception.message.clone())
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Caught::Standard(message.clone())
        } else if let Some(message) = payload.downcast_ref::<&'static str>() {
            Caught::Standard((*message).to_string())
        } else {
            Caught::Unknown
        };
        discard(payload);
        caught
    }

    pub fn return_code(&self) -> ReturnCode {
        match self {
            Caught::Standard(_) => ReturnCode::StandardError,
            Caught::Unknown => ReturnCode::UnknownError,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Caught::Standard(message) => Some(message),
            Caught::Unknown => None,
        }
    }

    /// Best-effort diagnostic. A panicking subscriber is swallowed.
    pub(crate) fn log(&self, op: &str) {
        let _ = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Caught::Standard(message) => tracing::error!(op, "{}", message),
            Caught::Unknown => tracing::error!(op, "Unknown exception occurred"),
        }));
    }
}

// A payload whose Drop panics must not escape the catch site.
fn discard(payload: Box<dyn Any + Send>) {
    let _ = panic::catch_unwind(AssertUnwindSafe(move || drop(payload)));
}

/// Runs `f`, catching any panic that escapes it.
pub fn translate<R>(f: impl FnOnce() -> R) -> Result<R, Caught> {
    crate::logging::install_panic_hook();
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(Caught::from_payload)
}
