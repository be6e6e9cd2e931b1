// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::HashMap;

use crate::Packet;

/// Named packets, e.g. the side inputs of a graph.
#[derive(Debug, Clone, Default)]
pub struct PacketMap {
    packets: HashMap<String, Packet>,
}

impl PacketMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `packet` under `key` unless the key is taken. Returns whether
    /// it was stored.
    pub fn emplace(&mut self, key: &str, packet: Packet) -> bool {
        if self.packets.contains_key(key) {
            return false;
        }
        self.packets.insert(key.to_string(), packet);
        true
    }

    /// Copy of the packet under `key`.
    pub fn find(&self, key: &str) -> Option<Packet> {
        self.packets.get(key).cloned()
    }

    /// Number of entries removed (0 or 1).
    pub fn erase(&mut self, key: &str) -> usize {
        usize::from(self.packets.remove(key).is_some())
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }

    pub fn size(&self) -> usize {
        self.packets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emplace_does_not_overwrite() {
        let mut map = PacketMap::new();
        assert!(map.emplace("threshold", Packet::make(0.5_f32)));
        assert!(!map.emplace("threshold", Packet::make(0.9_f32)));
        assert_eq!(*map.find("threshold").unwrap().get::<f32>(), 0.5);
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn find_missing_is_none() {
        let map = PacketMap::new();
        assert!(map.find("absent").is_none());
    }

    #[test]
    fn erase_and_clear() {
        let mut map = PacketMap::new();
        map.emplace("a", Packet::make(1_i32));
        map.emplace("b", Packet::make(2_i32));
        assert_eq!(map.erase("a"), 1);
        assert_eq!(map.erase("a"), 0);
        map.clear();
        assert_eq!(map.size(), 0);
    }
}
