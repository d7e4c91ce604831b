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

use std::collections::VecDeque;

use crate::{Error, Flit, Subnet, SUBNET_COUNT};

/// A (subnetwork, virtual channel) position in a destination's output queues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetAndVc {
    pub subnet: usize,
    pub vc: usize,
}

impl NetAndVc {
    pub fn new(subnet: Subnet, vc: usize) -> Self {
        Self {
            subnet: subnet.index(),
            vc,
        }
    }

    /// Same VC on the other subnetwork, then on to the first subnetwork of the
    /// next VC.
    fn advance(self, vc_count: usize) -> Self {
        if self.subnet + 1 < SUBNET_COUNT {
            Self {
                subnet: self.subnet + 1,
                vc: self.vc,
            }
        } else {
            Self {
                subnet: 0,
                vc: (self.vc + 1) % vc_count,
            }
        }
    }
}

/// Output queues of one destination: one FIFO per (subnetwork, VC).
#[derive(Debug)]
struct OutputQueues {
    queues: [Vec<VecDeque<Flit>>; SUBNET_COUNT],
    next_scan: NetAndVc,
}

impl OutputQueues {
    fn new(vc_count: usize) -> Self {
        Self {
            queues: [(); SUBNET_COUNT].map(|_| (0..vc_count).map(|_| VecDeque::new()).collect()),
            next_scan: NetAndVc::default(),
        }
    }

    fn queue(&mut self, at: NetAndVc) -> &mut VecDeque<Flit> {
        &mut self.queues[at.subnet][at.vc]
    }

    fn len(&self) -> usize {
        self.queues.iter().flatten().map(VecDeque::len).sum()
    }
}

/// Merges the ejected flits of both subnetworks into one stream per
/// destination.
///
/// Flits are served one at a time by a round-robin scan over (subnetwork, VC).
/// The scan stays on a queue until it serves a tail flit, so the flits of a
/// packet leave back to back, and then moves past it so every other queue
/// gets its turn before the same queue is served again.
#[derive(Debug)]
pub struct EgressMultiplexer {
    vc_count: usize,
    destinations: Vec<OutputQueues>,
}

impl EgressMultiplexer {
    pub fn new(node_count: usize, vc_count: usize) -> Self {
        assert!(vc_count > 0);
        Self {
            vc_count,
            destinations: (0..node_count).map(|_| OutputQueues::new(vc_count)).collect(),
        }
    }

    pub fn ingest(&mut self, subnet: Subnet, dest: usize, flit: Flit) -> Result<(), Error> {
        if flit.vc >= self.vc_count {
            return Err(Error::InvalidVirtualChannel {
                vc: flit.vc,
                vc_count: self.vc_count,
            });
        }
        log::trace!("egress {} ingest from {}: {}", dest, subnet, flit);
        self.destinations[dest].queues[subnet.index()][flit.vc].push_back(flit);
        Ok(())
    }

    /// Pops the next flit for `dest`, along with the subnetwork it came from.
    pub fn serve(&mut self, dest: usize) -> Option<(Subnet, Flit)> {
        let vc_count = self.vc_count;
        let outputs = &mut self.destinations[dest];
        let mut at = outputs.next_scan;
        for _ in 0..SUBNET_COUNT * vc_count {
            if let Some(flit) = outputs.queue(at).pop_front() {
                outputs.next_scan = if flit.tail {
                    at.advance(vc_count)
                } else {
                    at
                };
                log::trace!("egress {} serve {:?}: {}", dest, at, flit);
                return Some((Subnet::from_index(at.subnet), flit));
            }
            at = at.advance(vc_count);
        }
        None
    }

    /// Number of flits waiting at `dest`.
    pub fn pending(&self, dest: usize) -> usize {
        self.destinations[dest].len()
    }

    pub fn next_scan(&self, dest: usize) -> NetAndVc {
        self.destinations[dest].next_scan
    }
}
