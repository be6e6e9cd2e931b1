// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! String-keyed packet maps.

use std::ffi::{c_char, c_int};

use mpbridge_core::handle::{self, Borrowed, BorrowedMut, Out, OutHandle, Owned};
use mpbridge_core::marshal::{self, length_to_c};
use mpbridge_core::{ReturnCode, guard_exceptions};
use mpbridge_framework::{Packet, PacketMap};

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Create(map_out: *mut *mut PacketMap) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Create", || {
        let out = unsafe { OutHandle::new(map_out, "map_out") };
        out.write(Owned::new(PacketMap::new()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Destroy(map: *mut PacketMap) {
    unsafe { handle::destroy("mp_PacketMap__Destroy", map) }
}

/// Stores a copy of `packet` under `key`. An existing entry is kept.
/// The host still owns `packet`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Emplace(
    map: *mut PacketMap,
    key: *const c_char,
    packet: *const Packet,
) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Emplace", || {
        let mut map = unsafe { BorrowedMut::require(map, "map") };
        let key = unsafe { marshal::require_str(key, "key") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        if !map.emplace(key, (*packet).clone()) {
            tracing::debug!(key, "PacketMap already holds key; keeping existing packet");
        }
    })
}

/// New packet handle for `key`, or null if the key is absent.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Find(
    map: *const PacketMap,
    key: *const c_char,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Find", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let map = unsafe { Borrowed::require(map, "map") };
        let key = unsafe { marshal::require_str(key, "key") };
        out.write_option(map.find(key).map(Owned::new));
    })
}

/// Writes the number of removed entries (0 or 1).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Erase(
    map: *mut PacketMap,
    key: *const c_char,
    count_out: *mut c_int,
) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Erase", || {
        let mut map = unsafe { BorrowedMut::require(map, "map") };
        let key = unsafe { marshal::require_str(key, "key") };
        let out = unsafe { Out::new(count_out, "count_out") };
        out.write(length_to_c(map.erase(key)));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Clear(map: *mut PacketMap) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Clear", || {
        unsafe { BorrowedMut::require(map, "map") }.clear();
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_PacketMap__Size(
    map: *const PacketMap,
    size_out: *mut c_int,
) -> ReturnCode {
    guard_exceptions("mp_PacketMap__Size", || {
        let map = unsafe { Borrowed::require(map, "map") };
        unsafe { Out::new(size_out, "size_out") }.write(length_to_c(map.size()));
    })
}
