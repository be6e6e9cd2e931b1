// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::Status;

/// A serialized structured message. The boundary never decodes the bytes;
/// it only checks that the type name is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    type_name: String,
    bytes: Vec<u8>,
}

impl Message {
    /// Fails with `InvalidArgument` unless `type_name` is a dotted
    /// identifier such as `mediapipe.NormalizedLandmarkList`.
    pub fn from_serialized(type_name: &str, bytes: &[u8]) -> Result<Self, Status> {
        if !is_valid_type_name(type_name) {
            return Err(Status::invalid_argument(format!(
                "invalid message type name: \"{}\"",
                type_name
            )));
        }
        Ok(Self {
            type_name: type_name.to_string(),
            bytes: bytes.to_vec(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
