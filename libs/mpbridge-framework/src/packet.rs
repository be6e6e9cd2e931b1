// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Typed, timestamped, immutable values.
//!
//! Copies of a packet share one payload. [`Packet::get`] aborts on a type
//! mismatch; [`Packet::validate_as`] reports the same condition as a
//! [`Status`] instead.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use mpbridge_core::{check, fatal};

use crate::{Message, Status, StatusOr, Timestamp};

/// Types a packet can hold, with the name the host sees for each.
pub trait PacketType: Any + Send + Sync {
    const TYPE_NAME: &'static str;
}

/// Fixed-length float block. The host supplies the length when reading.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatArray(pub Box<[f32]>);

macro_rules! packet_types {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl PacketType for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )*
    };
}

packet_types! {
    bool => "bool",
    i32 => "int",
    i64 => "int64",
    f32 => "float",
    f64 => "double",
    String => "string",
    Vec<u8> => "bytes",
    FloatArray => "float[]",
    Vec<f32> => "vector<float>",
    Vec<i32> => "vector<int>",
    Message => "message",
    Vec<Message> => "vector<message>",
}

struct Holder {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Clone, Default)]
pub struct Packet {
    holder: Option<Arc<Holder>>,
    timestamp: Timestamp,
}

impl Packet {
    /// Packet holding `value`, timestamp unset.
    pub fn make<T: PacketType>(value: T) -> Self {
        Self {
            holder: Some(Arc::new(Holder {
                type_name: T::TYPE_NAME,
                value: Box::new(value),
            })),
            timestamp: Timestamp::UNSET,
        }
    }

    /// Copy sharing the payload, stamped with `timestamp`.
    pub fn at(&self, timestamp: Timestamp) -> Self {
        Self {
            holder: self.holder.clone(),
            timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Aborts if the packet is empty or holds another type.
    pub fn get<T: PacketType>(&self) -> &T {
        match self
            .holder
            .as_deref()
            .and_then(|holder| holder.value.downcast_ref::<T>())
        {
            Some(value) => value,
            None => fatal!("{}", self.validate_as::<T>()),
        }
    }

    /// First `len` elements of a [`FloatArray`]. Aborts if `len` exceeds it.
    pub fn get_float_array(&self, len: usize) -> &[f32] {
        let array = &self.get::<FloatArray>().0;
        check!(
            len <= array.len(),
            "requested {} floats from an array of {}",
            len,
            array.len()
        );
        &array[..len]
    }

    /// Moves the payload out if this packet is its only owner. The packet is
    /// empty afterwards. On failure the packet is unchanged.
    pub fn consume<T: PacketType>(&mut self) -> StatusOr<T> {
        let status = self.validate_as::<T>();
        if !status.ok() {
            return StatusOr::from_status(status);
        }
        let Some(holder) = self.holder.take() else {
            return StatusOr::from_status(Status::internal("packet emptied during consume"));
        };

        match Arc::try_unwrap(holder) {
            Ok(holder) => match holder.value.downcast::<T>() {
                Ok(value) => StatusOr::from_value(*value),
                Err(_) => StatusOr::from_status(Status::internal(format!(
                    "payload is not a {}",
                    T::TYPE_NAME
                ))),
            },
            Err(shared) => {
                self.holder = Some(shared);
                StatusOr::from_status(Status::failed_precondition(
                    "Packet isn't the sole owner of the holder.",
                ))
            }
        }
    }

    pub fn validate_as<T: PacketType>(&self) -> Status {
        match self.holder.as_deref() {
            None => Status::internal(format!(
                "Expected a Packet of type: {}, but received an empty Packet.",
                T::TYPE_NAME
            )),
            Some(holder) if holder.value.is::<T>() => Status::OK,
            Some(holder) => Status::invalid_argument(format!(
                "The Packet stores \"{}\", but \"{}\" was requested.",
                holder.type_name,
                T::TYPE_NAME
            )),
        }
    }

    /// Empty string for an empty packet.
    pub fn registered_type_name(&self) -> &'static str {
        self.holder.as_deref().map_or("", |holder| holder.type_name)
    }

    pub fn debug_type_name(&self) -> &'static str {
        self.holder.as_deref().map_or("{empty}", |holder| holder.type_name)
    }

    pub fn debug_string(&self) -> String {
        match self.holder.as_deref() {
            Some(holder) => format!(
                "Packet with timestamp: {} and type: {}",
                self.timestamp, holder.type_name
            ),
            None => format!("Packet with timestamp: {} and no data", self.timestamp),
        }
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;

    #[test]
    fn empty_packet() {
        let packet = Packet::default();
        assert!(packet.is_empty());
        assert_eq!(packet.timestamp(), Timestamp::UNSET);
        assert_eq!(packet.registered_type_name(), "");
        assert_eq!(packet.debug_type_name(), "{empty}");
        assert_eq!(
            packet.debug_string(),
            "Packet with timestamp: Timestamp::Unset() and no data"
        );
        assert_eq!(packet.validate_as::<i32>().code(), StatusCode::Internal);
    }

    #[test]
    fn typed_access() {
        let packet = Packet::make(7_i32).at(Timestamp::new(100));
        assert_eq!(*packet.get::<i32>(), 7);
        assert_eq!(packet.timestamp(), Timestamp::new(100));
        assert_eq!(packet.registered_type_name(), "int");
        assert_eq!(packet.debug_string(), "Packet with timestamp: 100 and type: int");
    }

    #[test]
    fn validate_reports_the_stored_type() {
        let packet = Packet::make(1.5_f64);
        assert!(packet.validate_as::<f64>().ok());
        let status = packet.validate_as::<String>();
        assert_eq!(status.code(), StatusCode::InvalidArgument);
        assert_eq!(
            status.message(),
            "The Packet stores \"double\", but \"string\" was requested."
        );
    }

    #[test]
    fn copies_share_the_payload() {
        let original = Packet::make(String::from("shared"));
        let copy = original.at(Timestamp::new(5));
        assert!(std::ptr::eq(original.get::<String>(), copy.get::<String>()));
        assert_eq!(original.timestamp(), Timestamp::UNSET);
    }

    #[test]
    fn consume_moves_the_only_copy() {
        let mut packet = Packet::make(String::from("payload"));
        let mut consumed = packet.consume::<String>();
        assert!(consumed.ok());
        assert_eq!(consumed.consume(), "payload");
        assert!(packet.is_empty());
    }

    #[test]
    fn consume_refuses_shared_payloads() {
        let mut packet = Packet::make(vec![1.0_f32, 2.0]);
        let _copy = packet.at(Timestamp::new(1));
        let consumed = packet.consume::<Vec<f32>>();
        assert_eq!(consumed.status().code(), StatusCode::FailedPrecondition);
        assert_eq!(packet.get::<Vec<f32>>(), &vec![1.0, 2.0]);
    }

    #[test]
    fn consume_of_wrong_type_leaves_the_packet() {
        let mut packet = Packet::make(true);
        let consumed = packet.consume::<i32>();
        assert_eq!(consumed.status().code(), StatusCode::InvalidArgument);
        assert!(*packet.get::<bool>());
    }

    #[test]
    fn float_array_prefix() {
        let packet = Packet::make(FloatArray(vec![1.0, 2.0, 3.0].into_boxed_slice()));
        assert_eq!(packet.get_float_array(2), &[1.0, 2.0]);
        assert_eq!(packet.get_float_array(0), &[] as &[f32]);
    }
}
