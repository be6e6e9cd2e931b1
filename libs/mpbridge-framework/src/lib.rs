// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native value types handed across the mpbridge boundary.
//!
//! These follow the conventions of the wrapped library: recoverable
//! failures come back as [`Status`], while misuse (reading a value of the
//! wrong type, reading an error as a value) is a fatal check that aborts.

pub mod message;
pub mod packet;
pub mod packet_map;
pub mod status;
pub mod status_or;
pub mod timestamp;

pub use message::Message;
pub use packet::{FloatArray, Packet, PacketType};
pub use packet_map::PacketMap;
pub use status::{Status, StatusCode};
pub use status_or::StatusOr;
pub use timestamp::Timestamp;
