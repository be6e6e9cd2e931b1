// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::{c_char, c_int};

use mpbridge_core::handle::{self, Borrowed, Out, OutHandle, Owned};
use mpbridge_core::{ReturnCode, guard_exceptions, marshal};
use mpbridge_framework::Status;

use crate::write_str;

/// Creates a status. `code` is kept verbatim; `message` may be null and is
/// dropped for code 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__Create(
    code: c_int,
    message: *const c_char,
    status_out: *mut *mut Status,
) -> ReturnCode {
    guard_exceptions("mp_Status__Create", || {
        let out = unsafe { OutHandle::new(status_out, "status_out") };
        let message = unsafe { marshal::read_str(message) }.unwrap_or_default();
        out.write(Owned::new(Status::from_raw(code, message)));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__Destroy(status: *mut Status) {
    unsafe { handle::destroy("mp_Status__Destroy", status) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__Ok(status: *const Status, ok_out: *mut bool) -> ReturnCode {
    guard_exceptions("mp_Status__Ok", || {
        let status = unsafe { Borrowed::require(status, "status") };
        unsafe { Out::new(ok_out, "ok_out") }.write(status.ok());
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__RawCode(
    status: *const Status,
    code_out: *mut c_int,
) -> ReturnCode {
    guard_exceptions("mp_Status__RawCode", || {
        let status = unsafe { Borrowed::require(status, "status") };
        unsafe { Out::new(code_out, "code_out") }.write(status.raw_code());
    })
}

/// Copies the message. An empty message is returned as null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__GetMessage(
    status: *const Status,
    message_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Status__GetMessage", || {
        let status = unsafe { Borrowed::require(status, "status") };
        unsafe { write_str(message_out, "message_out", status.message()) };
    })
}

/// `"OK"` or `"<CODE>: <message>"`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Status__ToString(
    status: *const Status,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Status__ToString", || {
        let status = unsafe { Borrowed::require(status, "status") };
        unsafe { write_str(str_out, "str_out", &status.to_string()) };
    })
}
