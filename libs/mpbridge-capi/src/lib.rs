// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// FFI cdylib: all public functions are unsafe extern "C" called from the host runtime.
#![allow(clippy::missing_safety_doc)]
#![allow(non_snake_case)]

//! C ABI for hosts that cannot unwind native frames or survive `abort()`.
//!
//! Every function returns a [`ReturnCode`] and writes real results through
//! out-parameters, except `*__Destroy`, which returns nothing. Symbols are
//! named `mp_<Type>__<Operation>`:
//!
//! - `Create*` / `mp__Make*` return a new owned handle;
//! - `Destroy` frees an owned handle (null is a no-op);
//! - `Get*` borrow the handle and return a copy or a new owned handle;
//! - `Consume*` move the handle's interior out and leave it spent.
//!
//! Buffers come back as `{data, len}` or `{data, size}` and are released with
//! the matching `mp_api_*__Destroy` from [`buffer`]. Empty is always
//! `{null, 0}`.
//!
//! Operations that can reach a fatal check run under
//! [`mpbridge_core::guard_all`] and report [`ReturnCode::Aborted`]; the
//! rest use the cheaper [`mpbridge_core::guard_exceptions`].

pub mod buffer;
pub mod logging;
pub mod packet;
pub mod packet_map;
pub mod status;
pub mod status_or;
pub mod timestamp;

pub use mpbridge_core::ReturnCode;
pub use mpbridge_core::marshal::{ByteBuffer, RecordArray, SerializedProto, SerializedProtoArray};
pub use mpbridge_framework::{Packet, PacketMap, Status, StatusOr, Timestamp};

pub type StatusOrString = StatusOr<String>;
pub type StatusOrPacket = StatusOr<Packet>;
pub type FloatArrayBuffer = RecordArray<f32>;
pub type IntArrayBuffer = RecordArray<i32>;

use std::ffi::c_char;
use std::ptr;

use mpbridge_core::handle::Out;
use mpbridge_core::marshal;

/// Clears `slot`, then stores a host-owned copy of `value` in it.
pub(crate) unsafe fn write_str(slot: *mut *mut c_char, name: &'static str, value: &str) {
    // SAFETY: forwarded from the caller.
    let out = unsafe { Out::reset(slot, name, ptr::null_mut()) };
    out.write(marshal::copy_str(value));
}
