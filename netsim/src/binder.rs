// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::{Error, PacketId, Subnet};

/// Remembers which subnetwork carries each open packet.
///
/// An entry is written by the head flit, read by every following flit and
/// released once the tail has been forwarded, so the map only holds packets
/// that are still being injected.
#[derive(Debug, Default)]
pub struct PacketBinder {
    packets: HashMap<PacketId, Subnet>,
}

impl PacketBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, pid: PacketId, subnet: Subnet) -> Result<(), Error> {
        match self.packets.entry(pid) {
            Entry::Occupied(_) => Err(Error::AlreadyBound(pid)),
            Entry::Vacant(entry) => {
                log::trace!("bind packet {} to {}", pid, subnet);
                entry.insert(subnet);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, pid: PacketId) -> Result<Subnet, Error> {
        self.packets
            .get(&pid)
            .copied()
            .ok_or(Error::UnknownPacket(pid))
    }

    pub fn is_bound(&self, pid: PacketId) -> bool {
        self.packets.contains_key(&pid)
    }

    pub fn release(&mut self, pid: PacketId) -> Option<Subnet> {
        self.packets.remove(&pid)
    }

    /// Number of packets whose tail has not been forwarded yet.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_lookup_release() {
        let mut binder = PacketBinder::new();
        binder.bind(7, Subnet::Tree).unwrap();
        assert_eq!(binder.lookup(7), Ok(Subnet::Tree));
        assert!(binder.is_bound(7) && !binder.is_bound(8));
        assert_eq!(binder.len(), 1);
        assert_eq!(binder.release(7), Some(Subnet::Tree));
        assert!(binder.is_empty());
        assert!(!binder.is_bound(7));
        assert_eq!(binder.lookup(7), Err(Error::UnknownPacket(7)));
    }

    #[test]
    fn test_double_bind() {
        let mut binder = PacketBinder::new();
        binder.bind(1, Subnet::Mesh).unwrap();
        assert_eq!(binder.bind(1, Subnet::Tree), Err(Error::AlreadyBound(1)));
        // the first binding survives
        assert_eq!(binder.lookup(1), Ok(Subnet::Mesh));
        // a released id can be reused by a later packet
        binder.release(1);
        assert_eq!(binder.bind(1, Subnet::Tree), Ok(()));
    }

    #[test]
    fn test_unknown_packet() {
        let binder = PacketBinder::new();
        assert_eq!(binder.lookup(42), Err(Error::UnknownPacket(42)));
    }
}
