// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::{c_char, c_int};

use mpbridge_core::handle::{self, Borrowed, Out, OutHandle, Owned};
use mpbridge_core::{ReturnCode, guard_all, guard_exceptions, native_bail};
use mpbridge_framework::Timestamp;
use mpbridge_framework::timestamp::SpecialTimestamp;

use crate::write_str;

// ============================================================================
// Lifecycle
// ============================================================================

/// `value` is in microseconds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__Create(
    value: i64,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_exceptions("mp_Timestamp__Create", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        out.write(Owned::new(Timestamp::new(value)));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__CreateFromSeconds(
    seconds: f64,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_exceptions("mp_Timestamp__CreateFromSeconds", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        out.write(Owned::new(Timestamp::from_seconds(seconds)));
    })
}

/// `kind`: 0 Unset, 1 Unstarted, 2 PreStream, 3 Min, 4 Max, 5 PostStream,
/// 6 OneOverPostStream, 7 Done. Anything else is a `StandardError`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__CreateSpecial(
    kind: c_int,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_exceptions("mp_Timestamp__CreateSpecial", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        let Some(special) = SpecialTimestamp::from_raw(kind) else {
            native_bail!("unknown special timestamp kind {}", kind)
        };
        out.write(Owned::new(special.timestamp()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__Destroy(timestamp: *mut Timestamp) {
    unsafe { handle::destroy("mp_Timestamp__Destroy", timestamp) }
}

// ============================================================================
// Accessors
// ============================================================================

macro_rules! timestamp_getter {
    ($name:ident, $out:ty, |$ts:ident| $body:expr) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(timestamp: *const Timestamp, value_out: *mut $out) -> ReturnCode {
            guard_exceptions(stringify!($name), || {
                let $ts = *unsafe { Borrowed::require(timestamp, "timestamp") };
                unsafe { Out::new(value_out, "value_out") }.write($body);
            })
        }
    };
}

timestamp_getter!(mp_Timestamp__Value, i64, |ts| ts.value());
timestamp_getter!(mp_Timestamp__Seconds, f64, |ts| ts.seconds());
timestamp_getter!(mp_Timestamp__Microseconds, i64, |ts| ts.microseconds());
timestamp_getter!(mp_Timestamp__IsSpecialValue, bool, |ts| ts.is_special_value());
timestamp_getter!(mp_Timestamp__IsRangeValue, bool, |ts| ts.is_range_value());
timestamp_getter!(mp_Timestamp__IsAllowedInStream, bool, |ts| ts.is_allowed_in_stream());

/// Decimal microseconds, or `Timestamp::<Name>()` for reserved values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__DebugString(
    timestamp: *const Timestamp,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Timestamp__DebugString", || {
        let timestamp = unsafe { Borrowed::require(timestamp, "timestamp") };
        unsafe { write_str(str_out, "str_out", &timestamp.debug_string()) };
    })
}

/// Aborts inside the wrapped library for `Unset` and `Unstarted`, so this
/// runs abort-guarded.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__NextAllowedInStream(
    timestamp: *const Timestamp,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_all("mp_Timestamp__NextAllowedInStream", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        let timestamp = unsafe { Borrowed::require(timestamp, "timestamp") };
        out.write(Owned::new(timestamp.next_allowed_in_stream()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Timestamp__PreviousAllowedInStream(
    timestamp: *const Timestamp,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_all("mp_Timestamp__PreviousAllowedInStream", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        let timestamp = unsafe { Borrowed::require(timestamp, "timestamp") };
        out.write(Owned::new(timestamp.previous_allowed_in_stream()));
    })
}
