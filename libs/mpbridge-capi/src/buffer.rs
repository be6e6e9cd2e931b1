// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Destructors for marshaled buffers.
//!
//! The host passes the struct fields back by value. Each function accepts
//! exactly what the producing call wrote, including `{null, 0}`, and frees
//! nested buffers before the outer block.

use std::ffi::{c_char, c_int};

use mpbridge_core::marshal::{self, ByteBuffer, RecordArray};

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_String__Destroy(ptr: *mut c_char) {
    unsafe { marshal::free_str(ptr) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_Bytes__Destroy(data: *mut u8, len: c_int) {
    unsafe { ByteBuffer { data, len }.free() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_FloatArray__Destroy(data: *mut f32, size: c_int) {
    unsafe { RecordArray { data, size }.free() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_IntArray__Destroy(data: *mut i32, size: c_int) {
    unsafe { RecordArray { data, size }.free() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_SerializedProto__Destroy(data: *mut u8, len: c_int) {
    unsafe { ByteBuffer { data, len }.free() }
}

/// Frees every message in the array, then the array itself.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_api_SerializedProtoArray__Destroy(
    data: *mut ByteBuffer,
    size: c_int,
) {
    unsafe { RecordArray { data, size }.free() }
}
