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

use std::collections::{HashSet, VecDeque};

use crate::config::{LinkConfiguration, MeshConfiguration, TreeConfiguration};
use crate::engine::{Hop, HopRouting, SubnetworkEngine};
use crate::topologies::{self, Topology};
use crate::{Credit, Cycle, Error, Flit, PacketId};
use petgraph::prelude::*;

#[derive(Debug)]
struct InFlight {
    flit: Flit,
    /// First cycle at which the flit may be ejected.
    ready_at: Cycle,
}

/// Latency and credit model of a subnetwork over a topology graph.
///
/// A flit injected at `source` becomes ejectable at its destination after
/// `hops * link.latency` cycles, where `hops` is the shortest router-to-router
/// distance. Ejection is gated by per-(destination, VC) credits: a flit only
/// leaves the network while its destination has a free ejection slot on its
/// VC, and the slot is given back by `credit_in`. An ejection VC is held by
/// one packet from its head to its tail, so packets never interleave on a
/// (destination, VC). Every injected flit frees an injection slot, reported on
/// `credit_out` of its source. Body and tail flits are only taken for a packet
/// whose head was injected at the same source on the same VC.
///
/// Inputs written during a cycle are picked up by `sample_inputs`, and
/// results of `evaluate` only become visible after `commit_outputs`.
#[derive(Debug)]
pub struct GraphEngine {
    name: String,
    topology: Topology,
    /// Hop distance to each node's terminal, indexed by node then vertex.
    distances: Vec<Vec<usize>>,
    vc_count: usize,
    link: LinkConfiguration,
    cycle: Cycle,

    /// Packets whose head was injected and tail was not, as (source, VC, id).
    open: HashSet<(usize, usize, PacketId)>,
    injected: Vec<(usize, Flit)>,
    in_flight: VecDeque<InFlight>,
    /// Flits ejected by the current evaluation, per destination.
    arrived: Vec<VecDeque<Flit>>,
    /// Flits waiting to be read at each destination.
    ejection: Vec<VecDeque<Flit>>,
    eject_credits: Vec<Vec<usize>>,
    /// Packet holding each (destination, VC) ejection channel.
    eject_owner: Vec<Vec<Option<PacketId>>>,
    /// Injection credits produced by the current cycle, per source.
    freed: Vec<VecDeque<Credit>>,
    inject_credits: Vec<VecDeque<Credit>>,
}

impl GraphEngine {
    pub fn new(name: &str, topology: Topology, vc_count: usize, link: LinkConfiguration) -> Self {
        assert!(vc_count > 0);
        let nodes = topology.node_count();
        let distances = (0..nodes).map(|node| topology.distances_to(node)).collect();
        log::debug!(
            "{}: {} nodes, {} routers, {} links, {} vcs",
            name,
            nodes,
            topology.vertex_count(),
            topology.link_count(),
            vc_count
        );
        Self {
            name: name.to_string(),
            topology,
            distances,
            vc_count,
            link,
            cycle: 0,
            open: HashSet::new(),
            injected: Vec::new(),
            in_flight: VecDeque::new(),
            arrived: vec![VecDeque::new(); nodes],
            ejection: vec![VecDeque::new(); nodes],
            eject_credits: vec![vec![link.buffer_depth; vc_count]; nodes],
            eject_owner: vec![vec![None; vc_count]; nodes],
            freed: vec![VecDeque::new(); nodes],
            inject_credits: vec![VecDeque::new(); nodes],
        }
    }

    pub fn mesh(config: &MeshConfiguration, vc_count: usize) -> Self {
        Self::new("mesh", topologies::mesh(&config.dims), vc_count, config.link)
    }

    pub fn tree(config: &TreeConfiguration, vc_count: usize) -> Self {
        Self::new("tree", topologies::tree(config.height), vc_count, config.link)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Flits injected but not yet readable at their destination.
    pub fn in_flight(&self) -> usize {
        self.injected.len()
            + self.in_flight.len()
            + self.arrived.iter().map(VecDeque::len).sum::<usize>()
    }

    /// Router-to-router hops between the terminals of two nodes.
    pub fn hops(&self, source: usize, dest: usize) -> usize {
        self.distances[dest][self.topology.terminal(source).index()]
    }

    fn check_node(&self, node: usize) -> Result<(), Error> {
        if node < self.topology.node_count() {
            Ok(())
        } else {
            Err(Error::OutOfRange {
                node,
                node_count: self.topology.node_count(),
            })
        }
    }

    fn check_vc(&self, vc: usize) -> Result<(), Error> {
        if vc < self.vc_count {
            Ok(())
        } else {
            Err(Error::InvalidVirtualChannel {
                vc,
                vc_count: self.vc_count,
            })
        }
    }
}

impl SubnetworkEngine for GraphEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    fn vc_count(&self) -> usize {
        self.vc_count
    }

    fn flit_in(&mut self, flit: Flit, source: usize) -> Result<(), Error> {
        self.check_node(source)?;
        self.check_node(flit.dest)?;
        self.check_vc(flit.vc)?;
        let key = (source, flit.vc, flit.pid);
        if flit.head {
            if self.open.contains(&key) {
                return Err(Error::AlreadyBound(flit.pid));
            }
            if !flit.tail {
                self.open.insert(key);
            }
        } else if flit.tail {
            if !self.open.remove(&key) {
                log::warn!("{}: tail without head at {}: {}", self.name, source, flit);
                return Err(Error::UnknownPacket(flit.pid));
            }
        } else if !self.open.contains(&key) {
            log::warn!("{}: body without head at {}: {}", self.name, source, flit);
            return Err(Error::UnknownPacket(flit.pid));
        }
        log::trace!("{} @{}: inject at {}: {}", self.name, self.cycle, source, flit);
        self.injected.push((source, flit));
        Ok(())
    }

    fn flit_out(&mut self, dest: usize) -> Result<Option<Flit>, Error> {
        self.check_node(dest)?;
        Ok(self.ejection[dest].pop_front())
    }

    fn credit_in(&mut self, credit: Credit, dest: usize) -> Result<(), Error> {
        self.check_node(dest)?;
        self.check_vc(credit.vc)?;
        let credits = &mut self.eject_credits[dest][credit.vc];
        *credits += 1;
        if *credits > self.link.buffer_depth {
            log::warn!(
                "{}: node {} vc {} has {} credits for {} slots",
                self.name,
                dest,
                credit.vc,
                credits,
                self.link.buffer_depth
            );
        }
        Ok(())
    }

    fn credit_out(&mut self, source: usize) -> Result<Option<Credit>, Error> {
        self.check_node(source)?;
        Ok(self.inject_credits[source].pop_front())
    }

    fn sample_inputs(&mut self) {
        for (source, mut flit) in std::mem::take(&mut self.injected) {
            let hops = self.hops(source, flit.dest);
            flit.hops = hops;
            self.freed[source].push_back(Credit::new(flit.vc));
            self.in_flight.push_back(InFlight {
                ready_at: self.cycle + hops * self.link.latency,
                flit,
            });
        }
    }

    fn evaluate(&mut self) {
        let cycle = self.cycle;
        let mut waiting = VecDeque::with_capacity(self.in_flight.len());
        for entry in self.in_flight.drain(..) {
            let (dest, vc, pid) = (entry.flit.dest, entry.flit.vc, entry.flit.pid);
            let owner = &mut self.eject_owner[dest][vc];
            let credits = &mut self.eject_credits[dest][vc];
            let granted = match *owner {
                Some(holder) => holder == pid,
                None => entry.flit.head,
            };
            if entry.ready_at <= cycle && granted && *credits > 0 {
                *credits -= 1;
                *owner = if entry.flit.tail { None } else { Some(pid) };
                self.arrived[dest].push_back(entry.flit);
            } else {
                waiting.push_back(entry);
            }
        }
        self.in_flight = waiting;
    }

    fn commit_outputs(&mut self) {
        for (arrived, ejection) in self.arrived.iter_mut().zip(self.ejection.iter_mut()) {
            for mut flit in arrived.drain(..) {
                flit.atime = Some(self.cycle);
                log::trace!("{} @{}: eject {}", self.name, self.cycle, flit);
                ejection.push_back(flit);
            }
        }
        for (freed, credits) in self.freed.iter_mut().zip(self.inject_credits.iter_mut()) {
            credits.extend(freed.drain(..));
        }
        self.cycle += 1;
    }
}

impl HopRouting for GraphEngine {
    /// Minimal routing: the lowest-numbered neighbour one hop closer to the
    /// destination terminal.
    fn next_hop(&self, vertex: usize, flit: &Flit) -> Result<Hop, Error> {
        self.check_node(flit.dest)?;
        let distances = &self.distances[flit.dest];
        let here = *distances.get(vertex).ok_or(Error::OutOfRange {
            node: vertex,
            node_count: self.topology.vertex_count(),
        })?;
        if here == 0 {
            return Ok(Hop::Eject);
        }
        self.topology
            .neighbors(NodeIndex::new(vertex))
            .map(NodeIndex::index)
            .filter(|&n| distances[n] == here - 1)
            .min()
            .map(Hop::Forward)
            .ok_or(Error::OutOfRange {
                node: flit.dest,
                node_count: self.topology.node_count(),
            })
    }
}
