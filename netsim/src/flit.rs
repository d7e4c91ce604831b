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

use std::fmt;

use crate::Cycle;

/// Packet identifier shared by all the flits of a packet.
pub type PacketId = usize;

/// The two subnetworks a composite network multiplexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subnet {
    Mesh = 0,
    Tree = 1,
}

pub const SUBNET_COUNT: usize = 2;

impl Subnet {
    pub const ALL: [Subnet; SUBNET_COUNT] = [Subnet::Mesh, Subnet::Tree];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Subnet {
        match index % SUBNET_COUNT {
            0 => Subnet::Mesh,
            _ => Subnet::Tree,
        }
    }

    pub fn other(self) -> Subnet {
        match self {
            Subnet::Mesh => Subnet::Tree,
            Subnet::Tree => Subnet::Mesh,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Subnet::Mesh => "mesh",
            Subnet::Tree => "tree",
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flow-control digit, the unit forwarded through the network.
///
/// A packet is one head flit, zero or more body flits and one tail flit; a
/// single-flit packet is both head and tail. Flits are created by the traffic
/// layer and only moved (never copied) through the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flit {
    pub id: usize,
    pub pid: PacketId,
    pub source: usize,
    pub dest: usize,
    pub vc: usize,
    pub head: bool,
    pub tail: bool,
    /// Cycle at which the traffic layer created the flit.
    pub ctime: Cycle,
    /// Cycle at which the flit was ejected at its destination.
    pub atime: Option<Cycle>,
    /// Router-to-router hops traversed.
    pub hops: usize,
}

impl Flit {
    pub fn new(id: usize, pid: PacketId, source: usize, dest: usize, vc: usize) -> Self {
        Self {
            id,
            pid,
            source,
            dest,
            vc,
            head: false,
            tail: false,
            ctime: 0,
            atime: None,
            hops: 0,
        }
    }

    pub fn head(mut self) -> Self {
        self.head = true;
        self
    }

    pub fn tail(mut self) -> Self {
        self.tail = true;
        self
    }

    pub fn created_at(mut self, ctime: Cycle) -> Self {
        self.ctime = ctime;
        self
    }

    /// Network latency, known once the flit has been ejected.
    pub fn latency(&self) -> Option<Cycle> {
        self.atime.map(|atime| atime.saturating_sub(self.ctime))
    }

    /// Builds the flits of a `len`-flit packet, head first.
    pub fn packet(
        pid: PacketId,
        source: usize,
        dest: usize,
        vc: usize,
        len: usize,
        ctime: Cycle,
    ) -> Vec<Flit> {
        assert!(len > 0, "a packet has at least one flit");
        (0..len)
            .map(|i| {
                let mut flit = Flit::new(i, pid, source, dest, vc).created_at(ctime);
                flit.head = i == 0;
                flit.tail = i + 1 == len;
                flit
            })
            .collect()
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "flit {}.{} {}->{} vc {}{}{}",
            self.pid,
            self.id,
            self.source,
            self.dest,
            self.vc,
            if self.head { " head" } else { "" },
            if self.tail { " tail" } else { "" },
        )
    }
}

/// Acknowledges that a buffer slot of virtual channel `vc` was freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credit {
    pub vc: usize,
}

impl Credit {
    pub fn new(vc: usize) -> Self {
        Self { vc }
    }
}
