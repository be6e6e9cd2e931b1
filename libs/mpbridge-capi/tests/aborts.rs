// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Operations that hit a fatal check report `Aborted` and leave the host
//! running.

#![cfg(unix)]

use std::ffi::{CString, c_char};
use std::ptr;

use serial_test::serial;

use mpbridge_capi::logging::*;
use mpbridge_capi::packet::*;
use mpbridge_capi::status::*;
use mpbridge_capi::status_or::*;
use mpbridge_capi::timestamp::*;
use mpbridge_capi::{FloatArrayBuffer, Packet, ReturnCode, StatusOrPacket};
use mpbridge_core::trap;

fn assert_trap_released() {
    assert_eq!(trap::depth(), 0);
    assert!(!trap::is_armed());
}

#[test]
#[serial]
fn wrong_type_get_is_aborted() {
    let mut packet = ptr::null_mut();
    assert_eq!(unsafe { mp__MakeIntPacket(7, &mut packet) }, ReturnCode::Success);

    let mut value = false;
    assert_eq!(unsafe { mp_Packet__GetBool(packet, &mut value) }, ReturnCode::Aborted);
    assert_trap_released();

    // The handle is still usable.
    let mut int = 0;
    assert_eq!(unsafe { mp_Packet__GetInt(packet, &mut int) }, ReturnCode::Success);
    assert_eq!(int, 7);
    unsafe { mp_Packet__Destroy(packet) };
}

#[test]
#[serial]
fn get_on_empty_packet_is_aborted() {
    let mut packet = ptr::null_mut();
    assert_eq!(unsafe { mp_Packet__Create(&mut packet) }, ReturnCode::Success);
    let mut text: *mut c_char = ptr::null_mut();
    assert_eq!(unsafe { mp_Packet__GetString(packet, &mut text) }, ReturnCode::Aborted);
    assert!(text.is_null());
    unsafe { mp_Packet__Destroy(packet) };
}

#[test]
#[serial]
fn oversized_float_array_request_is_aborted() {
    let data = [1.0f32, 2.0];
    let mut packet = ptr::null_mut();
    assert_eq!(
        unsafe { mp__MakeFloatArrayPacket(data.as_ptr(), 2, &mut packet) },
        ReturnCode::Success
    );
    let mut array = FloatArrayBuffer::default();
    assert_eq!(
        unsafe { mp_Packet__GetFloatArray(packet, 3, &mut array) },
        ReturnCode::Aborted
    );
    assert!(array.data.is_null());
    unsafe { mp_Packet__Destroy(packet) };
}

#[test]
#[serial]
fn status_or_value_without_value_is_aborted() {
    let type_name = CString::new("1bad").unwrap();
    let mut status_or: *mut StatusOrPacket = ptr::null_mut();
    assert_eq!(
        unsafe { mp__PacketFromMessage(type_name.as_ptr(), ptr::null(), 0, &mut status_or) },
        ReturnCode::Success
    );

    let mut packet: *mut Packet = ptr::null_mut();
    assert_eq!(
        unsafe { mp_StatusOrPacket__GetValue(status_or, &mut packet) },
        ReturnCode::Aborted
    );
    assert!(packet.is_null());
    assert_eq!(
        unsafe { mp_StatusOrPacket__ConsumeValue(status_or, &mut packet) },
        ReturnCode::Aborted
    );
    assert_trap_released();

    // The error is still readable afterwards.
    let mut status = ptr::null_mut();
    assert_eq!(
        unsafe { mp_StatusOrPacket__GetStatus(status_or, &mut status) },
        ReturnCode::Success
    );
    let mut raw = 0;
    assert_eq!(unsafe { mp_Status__RawCode(status, &mut raw) }, ReturnCode::Success);
    assert_eq!(raw, 3);

    unsafe {
        mp_Status__Destroy(status);
        mp_StatusOrPacket__Destroy(status_or);
    }
}

#[test]
#[serial]
fn next_allowed_after_unset_is_aborted() {
    let mut unset = ptr::null_mut();
    assert_eq!(unsafe { mp_Timestamp__CreateSpecial(0, &mut unset) }, ReturnCode::Success);

    let mut next = ptr::null_mut();
    assert_eq!(
        unsafe { mp_Timestamp__NextAllowedInStream(unset, &mut next) },
        ReturnCode::Aborted
    );
    assert!(next.is_null());

    let mut allowed = true;
    assert_eq!(
        unsafe { mp_Timestamp__IsAllowedInStream(unset, &mut allowed) },
        ReturnCode::Success
    );
    assert!(!allowed);
    unsafe { mp_Timestamp__Destroy(unset) };
}

#[test]
#[serial]
fn next_allowed_for_a_range_value_succeeds() {
    let mut timestamp = ptr::null_mut();
    assert_eq!(unsafe { mp_Timestamp__Create(10, &mut timestamp) }, ReturnCode::Success);
    let mut next = ptr::null_mut();
    assert_eq!(
        unsafe { mp_Timestamp__NextAllowedInStream(timestamp, &mut next) },
        ReturnCode::Success
    );
    let mut value = 0;
    assert_eq!(unsafe { mp_Timestamp__Value(next, &mut value) }, ReturnCode::Success);
    assert_eq!(value, 11);
    unsafe {
        mp_Timestamp__Destroy(next);
        mp_Timestamp__Destroy(timestamp);
    }
}

#[test]
#[serial]
fn unknown_special_kind_is_a_standard_error() {
    let mut timestamp = ptr::null_mut();
    assert_eq!(
        unsafe { mp_Timestamp__CreateSpecial(42, &mut timestamp) },
        ReturnCode::StandardError
    );
    assert!(timestamp.is_null());
}

#[test]
#[serial]
fn fatal_log_is_aborted() {
    let message = CString::new("host requested a fatal log").unwrap();
    assert_eq!(unsafe { mp_Logging__Log(3, message.as_ptr()) }, ReturnCode::Aborted);
    assert_eq!(unsafe { mp_Logging__Log(0, message.as_ptr()) }, ReturnCode::Success);
    assert_eq!(unsafe { mp_Logging__Log(9, message.as_ptr()) }, ReturnCode::StandardError);
    assert_trap_released();
}
