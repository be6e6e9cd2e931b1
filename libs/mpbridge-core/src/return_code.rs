// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

use crate::error::{BridgeError, Result};

/// Outcome of one boundary call, returned by value from every `mp_*` function.
///
/// The numeric values are part of the host ABI. `Aborted` mirrors the shell
/// convention for a process killed by `SIGABRT` (128 + 6).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success = 0,
    /// A recognized exception ([`crate::NativeException`] or a panic message) was caught.
    StandardError = 1,
    /// A panic with an unrecognized payload was caught.
    UnknownError = 70,
    /// Initial value of every call. Never returned to the host.
    Unset = 128,
    /// A fatal check raised `SIGABRT` inside an abort-guarded call.
    Aborted = 134,
}

impl ReturnCode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Success),
            1 => Some(Self::StandardError),
            70 => Some(Self::UnknownError),
            128 => Some(Self::Unset),
            134 => Some(Self::Aborted),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Converts the code into a `Result` for Rust-side callers of the C surface.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            code => Err(BridgeError::Call(code)),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::StandardError => "StandardError",
            Self::UnknownError => "UnknownError",
            Self::Unset => "Unset",
            Self::Aborted => "Aborted",
        };
        write!(f, "{} ({})", name, self.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_are_stable() {
        assert_eq!(ReturnCode::Success.as_raw(), 0);
        assert_eq!(ReturnCode::StandardError.as_raw(), 1);
        assert_eq!(ReturnCode::UnknownError.as_raw(), 70);
        assert_eq!(ReturnCode::Unset.as_raw(), 128);
        assert_eq!(ReturnCode::Aborted.as_raw(), 134);
    }

    #[test]
    fn from_raw_rejects_unknown_values() {
        assert_eq!(ReturnCode::from_raw(134), Some(ReturnCode::Aborted));
        assert_eq!(ReturnCode::from_raw(2), None);
        assert_eq!(ReturnCode::from_raw(-1), None);
    }

    #[test]
    fn into_result_keeps_the_failing_code() {
        assert!(ReturnCode::Success.into_result().is_ok());
        match ReturnCode::Aborted.into_result() {
            Err(BridgeError::Call(code)) => assert_eq!(code, ReturnCode::Aborted),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn display_includes_the_raw_value() {
        assert_eq!(ReturnCode::UnknownError.to_string(), "UnknownError (70)");
    }
}
