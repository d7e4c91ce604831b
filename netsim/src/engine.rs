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

use crate::{Credit, Error, Flit, Subnet};

/// Common interface of a simulated network.
///
/// Both subnetworks of a composite network implement it, and so does the
/// composite itself. Nothing blocks: outputs that are not ready in the current
/// cycle are reported as `None`.
pub trait SubnetworkEngine {
    fn name(&self) -> &str;
    fn node_count(&self) -> usize;
    fn vc_count(&self) -> usize;

    /// Injects `flit` at node `source`.
    fn flit_in(&mut self, flit: Flit, source: usize) -> Result<(), Error>;
    /// Ejects at most one flit at node `dest`.
    fn flit_out(&mut self, dest: usize) -> Result<Option<Flit>, Error>;
    /// Returns an ejection-buffer credit from node `dest` to the network.
    fn credit_in(&mut self, credit: Credit, dest: usize) -> Result<(), Error>;
    /// Polls the injection-credit channel of node `source`.
    fn credit_out(&mut self, source: usize) -> Result<Option<Credit>, Error>;

    fn sample_inputs(&mut self);
    fn evaluate(&mut self);
    fn commit_outputs(&mut self);

    /// Advances the network by one cycle.
    fn step(&mut self) {
        self.sample_inputs();
        self.evaluate();
        self.commit_outputs();
    }
}

/// Per-hop routing decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hop {
    /// Forward to the given topology vertex.
    Forward(usize),
    /// The flit is at its destination router.
    Eject,
}

/// Networks whose routers can be asked where a flit goes next.
pub trait HopRouting {
    fn next_hop(&self, vertex: usize, flit: &Flit) -> Result<Hop, Error>;
}

/// The two independently owned engines of a composite network.
#[derive(Debug)]
pub struct SubnetPair<M, T> {
    pub mesh: M,
    pub tree: T,
}

impl<M: SubnetworkEngine, T: SubnetworkEngine> SubnetPair<M, T> {
    pub fn new(mesh: M, tree: T) -> Self {
        Self { mesh, tree }
    }

    pub fn get_mut(&mut self, subnet: Subnet) -> &mut dyn SubnetworkEngine {
        match subnet {
            Subnet::Mesh => &mut self.mesh,
            Subnet::Tree => &mut self.tree,
        }
    }
}

impl<M: HopRouting, T: HopRouting> SubnetPair<M, T> {
    pub fn next_hop(&self, subnet: Subnet, vertex: usize, flit: &Flit) -> Result<Hop, Error> {
        match subnet {
            Subnet::Mesh => self.mesh.next_hop(vertex, flit),
            Subnet::Tree => self.tree.next_hop(vertex, flit),
        }
    }
}
