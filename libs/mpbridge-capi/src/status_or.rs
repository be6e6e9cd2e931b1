// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! `StatusOr<String>` and `StatusOr<Packet>` handles.
//!
//! `GetValue` and `ConsumeValue` abort inside the wrapped library when the
//! holder has no value, so they run abort-guarded and report `Aborted`
//! instead of terminating the host. Check `Ok` first.

use std::ffi::c_char;

use mpbridge_core::handle::{self, Borrowed, BorrowedMut, Out, OutHandle, Owned};
use mpbridge_core::{ReturnCode, guard_all, guard_exceptions};
use mpbridge_framework::{Packet, Status};

use crate::{StatusOrPacket, StatusOrString, write_str};

// ============================================================================
// StatusOr<String>
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrString__Destroy(status_or: *mut StatusOrString) {
    unsafe { handle::destroy("mp_StatusOrString__Destroy", status_or) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrString__Ok(
    status_or: *const StatusOrString,
    ok_out: *mut bool,
) -> ReturnCode {
    guard_exceptions("mp_StatusOrString__Ok", || {
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        unsafe { Out::new(ok_out, "ok_out") }.write(status_or.ok());
    })
}

/// New owned copy of the status (OK when a value is held).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrString__GetStatus(
    status_or: *const StatusOrString,
    status_out: *mut *mut Status,
) -> ReturnCode {
    guard_exceptions("mp_StatusOrString__GetStatus", || {
        let out = unsafe { OutHandle::new(status_out, "status_out") };
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        out.write(Owned::new(status_or.status()));
    })
}

/// Copies the value; the holder keeps it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrString__GetValue(
    status_or: *const StatusOrString,
    value_out: *mut *mut c_char,
) -> ReturnCode {
    guard_all("mp_StatusOrString__GetValue", || {
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        unsafe { write_str(value_out, "value_out", status_or.value()) };
    })
}

/// Moves the value into a host string. The holder is spent afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrString__ConsumeValue(
    status_or: *mut StatusOrString,
    value_out: *mut *mut c_char,
) -> ReturnCode {
    guard_all("mp_StatusOrString__ConsumeValue", || {
        let mut status_or = unsafe { BorrowedMut::require(status_or, "status_or") };
        let out = unsafe { Out::reset(value_out, "value_out", std::ptr::null_mut()) };
        let value = status_or.consume();
        out.write(mpbridge_core::marshal::copy_str(&value));
    })
}

// ============================================================================
// StatusOr<Packet>
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrPacket__Destroy(status_or: *mut StatusOrPacket) {
    unsafe { handle::destroy("mp_StatusOrPacket__Destroy", status_or) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrPacket__Ok(
    status_or: *const StatusOrPacket,
    ok_out: *mut bool,
) -> ReturnCode {
    guard_exceptions("mp_StatusOrPacket__Ok", || {
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        unsafe { Out::new(ok_out, "ok_out") }.write(status_or.ok());
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrPacket__GetStatus(
    status_or: *const StatusOrPacket,
    status_out: *mut *mut Status,
) -> ReturnCode {
    guard_exceptions("mp_StatusOrPacket__GetStatus", || {
        let out = unsafe { OutHandle::new(status_out, "status_out") };
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        out.write(Owned::new(status_or.status()));
    })
}

/// New owned packet sharing the held packet's payload.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrPacket__GetValue(
    status_or: *const StatusOrPacket,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_all("mp_StatusOrPacket__GetValue", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let status_or = unsafe { Borrowed::require(status_or, "status_or") };
        out.write(Owned::new(status_or.value().clone()));
    })
}

/// Moves the held packet into a new owned handle. The holder is spent
/// afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_StatusOrPacket__ConsumeValue(
    status_or: *mut StatusOrPacket,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_all("mp_StatusOrPacket__ConsumeValue", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let mut status_or = unsafe { BorrowedMut::require(status_or, "status_or") };
        out.write(Owned::new(status_or.consume()));
    })
}
