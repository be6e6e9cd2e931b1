// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

/// Canonical error space of the wrapped library.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl StatusCode {
    /// Codes outside the canonical space read as `Unknown`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::Cancelled,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

/// Result of a native operation: a code plus a message. The message of an
/// OK status is always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    raw_code: i32,
    message: String,
}

macro_rules! status_constructors {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(StatusCode::$code, message)
            }
        )*
    };
}

impl Status {
    pub const OK: Status = Status {
        raw_code: 0,
        message: String::new(),
    };

    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self::from_raw(code as i32, message)
    }

    /// Keeps `raw_code` as given, even outside the canonical space.
    pub fn from_raw(raw_code: i32, message: impl Into<String>) -> Self {
        if raw_code == 0 {
            return Self::OK;
        }
        Self {
            raw_code,
            message: message.into(),
        }
    }

    status_constructors! {
        cancelled => Cancelled,
        unknown => Unknown,
        invalid_argument => InvalidArgument,
        deadline_exceeded => DeadlineExceeded,
        not_found => NotFound,
        already_exists => AlreadyExists,
        permission_denied => PermissionDenied,
        resource_exhausted => ResourceExhausted,
        failed_precondition => FailedPrecondition,
        aborted => Aborted,
        out_of_range => OutOfRange,
        unimplemented => Unimplemented,
        internal => Internal,
        unavailable => Unavailable,
        data_loss => DataLoss,
        unauthenticated => Unauthenticated,
    }

    pub fn ok(&self) -> bool {
        self.raw_code == 0
    }

    pub fn code(&self) -> StatusCode {
        StatusCode::from_raw(self.raw_code)
    }

    pub fn raw_code(&self) -> i32 {
        self.raw_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok() {
            return f.write_str("OK");
        }
        write!(f, "{}: {}", self.code().as_str(), self.message)
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status() {
        let status = Status::from_raw(5, "missing resource");
        assert!(!status.ok());
        assert_eq!(status.code(), StatusCode::NotFound);
        assert_eq!(status.raw_code(), 5);
        assert_eq!(status.message(), "missing resource");
        assert_eq!(status.to_string(), "NOT_FOUND: missing resource");
    }

    #[test]
    fn ok_status_drops_its_message() {
        let status = Status::new(StatusCode::Ok, "ignored");
        assert!(status.ok());
        assert_eq!(status.message(), "");
        assert_eq!(status.to_string(), "OK");
        assert_eq!(status, Status::OK);
    }

    #[test]
    fn raw_code_outside_the_canonical_space_reads_as_unknown() {
        let status = Status::from_raw(99, "vendor specific");
        assert_eq!(status.code(), StatusCode::Unknown);
        assert_eq!(status.raw_code(), 99);
        assert_eq!(status.to_string(), "UNKNOWN: vendor specific");
    }

    #[test]
    fn named_constructors_set_the_code() {
        assert_eq!(
            Status::failed_precondition("not started").code(),
            StatusCode::FailedPrecondition
        );
        assert_eq!(Status::internal("").to_string(), "INTERNAL: ");
    }
}
