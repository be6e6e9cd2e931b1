// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Packet handles.
//!
//! Typed `Get*` accessors abort inside the wrapped library when the packet
//! is empty or holds another type, so all of them are abort-guarded. Use
//! `ValidateAs*` to check the type without risking an abort.

use std::ffi::{c_char, c_int};

use mpbridge_core::handle::{self, Borrowed, BorrowedMut, Out, OutHandle, Owned};
use mpbridge_core::marshal::{self, ByteBuffer, RecordArray};
use mpbridge_core::{ReturnCode, guard_all, guard_exceptions, native_bail};
use mpbridge_framework::{FloatArray, Message, Packet, Status, StatusOr, Timestamp};

use crate::{
    FloatArrayBuffer, IntArrayBuffer, SerializedProto, SerializedProtoArray, StatusOrPacket,
    StatusOrString, write_str,
};

// ============================================================================
// Lifecycle
// ============================================================================

/// Creates an empty packet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__Create(packet_out: *mut *mut Packet) -> ReturnCode {
    guard_exceptions("mp_Packet__Create", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        out.write(Owned::new(Packet::default()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__Destroy(packet: *mut Packet) {
    unsafe { handle::destroy("mp_Packet__Destroy", packet) }
}

/// New packet sharing the payload of `packet`, stamped with `timestamp`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__At(
    packet: *const Packet,
    timestamp: *const Timestamp,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp_Packet__At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        let timestamp = unsafe { Borrowed::require(timestamp, "timestamp") };
        out.write(Owned::new(packet.at(*timestamp)));
    })
}

// ============================================================================
// Metadata
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__IsEmpty(packet: *const Packet, empty_out: *mut bool) -> ReturnCode {
    guard_exceptions("mp_Packet__IsEmpty", || {
        let packet = unsafe { Borrowed::require(packet, "packet") };
        unsafe { Out::new(empty_out, "empty_out") }.write(packet.is_empty());
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetTimestamp(
    packet: *const Packet,
    timestamp_out: *mut *mut Timestamp,
) -> ReturnCode {
    guard_exceptions("mp_Packet__GetTimestamp", || {
        let out = unsafe { OutHandle::new(timestamp_out, "timestamp_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        out.write(Owned::new(packet.timestamp()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__DebugString(
    packet: *const Packet,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Packet__DebugString", || {
        let packet = unsafe { Borrowed::require(packet, "packet") };
        unsafe { write_str(str_out, "str_out", &packet.debug_string()) };
    })
}

/// Null for an empty packet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__RegisteredTypeName(
    packet: *const Packet,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Packet__RegisteredTypeName", || {
        let packet = unsafe { Borrowed::require(packet, "packet") };
        unsafe { write_str(str_out, "str_out", packet.registered_type_name()) };
    })
}

/// `{empty}` for an empty packet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__DebugTypeName(
    packet: *const Packet,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_exceptions("mp_Packet__DebugTypeName", || {
        let packet = unsafe { Borrowed::require(packet, "packet") };
        unsafe { write_str(str_out, "str_out", packet.debug_type_name()) };
    })
}

// ============================================================================
// Type checks
// ============================================================================

macro_rules! validate_as {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            /// Writes an OK status if the packet holds this type, otherwise
            /// the mismatch as an error status. Never aborts.
            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn $name(
                packet: *const Packet,
                status_out: *mut *mut Status,
            ) -> ReturnCode {
                guard_exceptions(stringify!($name), || {
                    let out = unsafe { OutHandle::new(status_out, "status_out") };
                    let packet = unsafe { Borrowed::require(packet, "packet") };
                    out.write(Owned::new(packet.validate_as::<$ty>()));
                })
            }
        )*
    };
}

validate_as! {
    mp_Packet__ValidateAsBool => bool,
    mp_Packet__ValidateAsInt => i32,
    mp_Packet__ValidateAsInt64 => i64,
    mp_Packet__ValidateAsFloat => f32,
    mp_Packet__ValidateAsDouble => f64,
    mp_Packet__ValidateAsString => String,
    mp_Packet__ValidateAsBytes => Vec<u8>,
    mp_Packet__ValidateAsFloatArray => FloatArray,
    mp_Packet__ValidateAsFloatVector => Vec<f32>,
    mp_Packet__ValidateAsIntVector => Vec<i32>,
    mp_Packet__ValidateAsMessage => Message,
    mp_Packet__ValidateAsMessageVector => Vec<Message>,
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! scalar_packet {
    ($ty:ty, $make:ident, $make_at:ident, $get:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $make(value: $ty, packet_out: *mut *mut Packet) -> ReturnCode {
            guard_exceptions(stringify!($make), || {
                let out = unsafe { OutHandle::new(packet_out, "packet_out") };
                out.write(Owned::new(Packet::make(value)));
            })
        }

        /// `timestamp` is in microseconds.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $make_at(
            value: $ty,
            timestamp: i64,
            packet_out: *mut *mut Packet,
        ) -> ReturnCode {
            guard_exceptions(stringify!($make_at), || {
                let out = unsafe { OutHandle::new(packet_out, "packet_out") };
                out.write(Owned::new(Packet::make(value).at(Timestamp::new(timestamp))));
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $get(packet: *const Packet, value_out: *mut $ty) -> ReturnCode {
            guard_all(stringify!($get), || {
                let packet = unsafe { Borrowed::require(packet, "packet") };
                unsafe { Out::new(value_out, "value_out") }.write(*(*packet).get::<$ty>());
            })
        }
    };
}

scalar_packet!(bool, mp__MakeBoolPacket, mp__MakeBoolPacket_At, mp_Packet__GetBool);
scalar_packet!(i32, mp__MakeIntPacket, mp__MakeIntPacket_At, mp_Packet__GetInt);
scalar_packet!(i64, mp__MakeInt64Packet, mp__MakeInt64Packet_At, mp_Packet__GetInt64);
scalar_packet!(f32, mp__MakeFloatPacket, mp__MakeFloatPacket_At, mp_Packet__GetFloat);
scalar_packet!(f64, mp__MakeDoublePacket, mp__MakeDoublePacket_At, mp_Packet__GetDouble);

// ============================================================================
// Strings and bytes
// ============================================================================

/// `value` is a NUL-terminated UTF-8 string; null makes an empty string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeStringPacket(
    value: *const c_char,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeStringPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let value = unsafe { marshal::read_str(value) }.unwrap_or_default();
        out.write(Owned::new(Packet::make(value.to_string())));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeStringPacket_At(
    value: *const c_char,
    timestamp: i64,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeStringPacket_At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let value = unsafe { marshal::read_str(value) }.unwrap_or_default();
        out.write(Owned::new(
            Packet::make(value.to_string()).at(Timestamp::new(timestamp)),
        ));
    })
}

/// Copies the string. The empty string comes back as null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetString(
    packet: *const Packet,
    str_out: *mut *mut c_char,
) -> ReturnCode {
    guard_all("mp_Packet__GetString", || {
        let packet = unsafe { Borrowed::require(packet, "packet") };
        unsafe { write_str(str_out, "str_out", (*packet).get::<String>()) };
    })
}

/// Moves the string out of `packet` if it is the payload's only owner.
/// The packet is empty afterwards; otherwise the result holds the reason.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__ConsumeString(
    packet: *mut Packet,
    status_or_out: *mut *mut StatusOrString,
) -> ReturnCode {
    guard_exceptions("mp_Packet__ConsumeString", || {
        let out = unsafe { OutHandle::new(status_or_out, "status_or_out") };
        let mut packet = unsafe { BorrowedMut::require(packet, "packet") };
        out.write(Owned::new(packet.consume::<String>()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeBytesPacket(
    data: *const u8,
    size: c_int,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeBytesPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let bytes = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(Packet::make(bytes.to_vec())));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeBytesPacket_At(
    data: *const u8,
    size: c_int,
    timestamp: i64,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeBytesPacket_At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let bytes = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(
            Packet::make(bytes.to_vec()).at(Timestamp::new(timestamp)),
        ));
    })
}

/// Free with `mp_api_Bytes__Destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetBytes(
    packet: *const Packet,
    bytes_out: *mut ByteBuffer,
) -> ReturnCode {
    guard_all("mp_Packet__GetBytes", || {
        let out = unsafe { Out::cleared(bytes_out, "bytes_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        out.write(ByteBuffer::copy_from((*packet).get::<Vec<u8>>().as_slice()));
    })
}

// ============================================================================
// Float and int arrays
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeFloatArrayPacket(
    data: *const f32,
    size: c_int,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeFloatArrayPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(Packet::make(FloatArray(values.into()))));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeFloatArrayPacket_At(
    data: *const f32,
    size: c_int,
    timestamp: i64,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeFloatArrayPacket_At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(
            Packet::make(FloatArray(values.into())).at(Timestamp::new(timestamp)),
        ));
    })
}

/// Copies the first `size` floats. Asking for more than the array holds is
/// a fatal check and reports `Aborted`. Free with `mp_api_FloatArray__Destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetFloatArray(
    packet: *const Packet,
    size: c_int,
    array_out: *mut FloatArrayBuffer,
) -> ReturnCode {
    guard_all("mp_Packet__GetFloatArray", || {
        let out = unsafe { Out::cleared(array_out, "array_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        let Ok(len) = usize::try_from(size) else {
            native_bail!("negative float array size {}", size)
        };
        out.write(RecordArray::copy_from(packet.get_float_array(len)));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeFloatVectorPacket(
    data: *const f32,
    size: c_int,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeFloatVectorPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(Packet::make(values.to_vec())));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeFloatVectorPacket_At(
    data: *const f32,
    size: c_int,
    timestamp: i64,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeFloatVectorPacket_At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(
            Packet::make(values.to_vec()).at(Timestamp::new(timestamp)),
        ));
    })
}

/// Free with `mp_api_FloatArray__Destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetFloatVector(
    packet: *const Packet,
    array_out: *mut FloatArrayBuffer,
) -> ReturnCode {
    guard_all("mp_Packet__GetFloatVector", || {
        let out = unsafe { Out::cleared(array_out, "array_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        out.write(RecordArray::copy_from((*packet).get::<Vec<f32>>().as_slice()));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeIntVectorPacket(
    data: *const i32,
    size: c_int,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeIntVectorPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(Packet::make(values.to_vec())));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeIntVectorPacket_At(
    data: *const i32,
    size: c_int,
    timestamp: i64,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeIntVectorPacket_At", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let values = unsafe { marshal::borrow_slice(data, size, "data") };
        out.write(Owned::new(
            Packet::make(values.to_vec()).at(Timestamp::new(timestamp)),
        ));
    })
}

/// Free with `mp_api_IntArray__Destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetIntVector(
    packet: *const Packet,
    array_out: *mut IntArrayBuffer,
) -> ReturnCode {
    guard_all("mp_Packet__GetIntVector", || {
        let out = unsafe { Out::cleared(array_out, "array_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        out.write(RecordArray::copy_from((*packet).get::<Vec<i32>>().as_slice()));
    })
}

// ============================================================================
// Messages
// ============================================================================

/// Builds a message packet. A malformed type name is reported through the
/// returned holder's status, not the return code.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__PacketFromMessage(
    type_name: *const c_char,
    data: *const u8,
    size: c_int,
    status_or_out: *mut *mut StatusOrPacket,
) -> ReturnCode {
    guard_exceptions("mp__PacketFromMessage", || {
        let out = unsafe { OutHandle::new(status_or_out, "status_or_out") };
        let type_name = unsafe { marshal::read_str(type_name) }.unwrap_or_default();
        let bytes = unsafe { marshal::borrow_slice(data, size, "data") };
        let result = Message::from_serialized(type_name, bytes).map(Packet::make);
        out.write(Owned::new(StatusOr::from(result)));
    })
}

/// Builds a packet holding `count` messages of `type_name`, copied from the
/// host's `{data, len}` records. The records stay owned by the host.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp__MakeMessageVectorPacket(
    type_name: *const c_char,
    messages: *const SerializedProto,
    count: c_int,
    packet_out: *mut *mut Packet,
) -> ReturnCode {
    guard_exceptions("mp__MakeMessageVectorPacket", || {
        let out = unsafe { OutHandle::new(packet_out, "packet_out") };
        let type_name = unsafe { marshal::require_str(type_name, "type_name") };
        let records = unsafe { marshal::borrow_slice(messages, count, "messages") };

        let mut decoded = Vec::with_capacity(records.len());
        for record in records {
            let bytes =
                unsafe { marshal::borrow_slice(record.data.cast_const(), record.len, "message") };
            match Message::from_serialized(type_name, bytes) {
                Ok(message) => decoded.push(message),
                Err(status) => native_bail!("{}", status),
            }
        }
        out.write(Owned::new(Packet::make(decoded)));
    })
}

/// Free with `mp_api_SerializedProto__Destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetMessage(
    packet: *const Packet,
    message_out: *mut SerializedProto,
) -> ReturnCode {
    guard_all("mp_Packet__GetMessage", || {
        let out = unsafe { Out::cleared(message_out, "message_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        out.write(ByteBuffer::copy_from((*packet).get::<Message>().bytes()));
    })
}

/// Free with `mp_api_SerializedProtoArray__Destroy`, which also frees every
/// message in the array.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mp_Packet__GetMessageVector(
    packet: *const Packet,
    array_out: *mut SerializedProtoArray,
) -> ReturnCode {
    guard_all("mp_Packet__GetMessageVector", || {
        let out = unsafe { Out::cleared(array_out, "array_out") };
        let packet = unsafe { Borrowed::require(packet, "packet") };
        let records = (*packet)
            .get::<Vec<Message>>()
            .iter()
            .map(|message| ByteBuffer::copy_from(message.bytes()))
            .collect();
        out.write(RecordArray::from_vec(records));
    })
}
