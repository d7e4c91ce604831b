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

use crate::binder::PacketBinder;
use crate::config::NetworkConfiguration;
use crate::credit::CreditRouter;
use crate::egress::EgressMultiplexer;
use crate::engine::{Hop, HopRouting, SubnetPair, SubnetworkEngine};
use crate::graph_engine::GraphEngine;
use crate::injection::{InjectionPolicy, InjectionRouter};
use crate::latency::LatencyPredictor;
use crate::routing::{RouteRequest, RoutingTable};
use crate::{Credit, Cycle, Error, Flit, Subnet, SUBNET_COUNT};

/// Name under which a composite network registers its routing function.
pub const COMPOSITE_ROUTING: &str = "composite";

/// One network interface over two independently simulated subnetworks.
///
/// Every packet is bound to one subnetwork when its head flit is injected and
/// all its later flits follow it there. Flits ejected by either subnetwork are
/// merged per destination by an [`EgressMultiplexer`], and credits are routed
/// back to whichever subnetwork carried the matching flit.
///
/// The composite is itself a [`SubnetworkEngine`], so it can be used anywhere
/// a single subnetwork is expected.
pub struct CompositeNetwork<M, T> {
    node_count: usize,
    vc_count: usize,
    engines: SubnetPair<M, T>,
    binder: PacketBinder,
    injection: InjectionRouter,
    latency: LatencyPredictor,
    egress: EgressMultiplexer,
    credits: CreditRouter,
}

impl CompositeNetwork<GraphEngine, GraphEngine> {
    /// Builds both subnetworks from the configuration.
    pub fn from_config(config: &NetworkConfiguration) -> Result<Self, Error> {
        config.validate_topologies()?;
        let mesh = GraphEngine::mesh(&config.mesh, config.vc_count);
        let tree = GraphEngine::tree(&config.tree, config.vc_count);
        Self::new(config, mesh, tree)
    }
}

fn check_engine(
    subnet: Subnet,
    engine: &dyn SubnetworkEngine,
    config: &NetworkConfiguration,
) -> Result<(), Error> {
    if engine.node_count() != config.node_count {
        return Err(Error::TopologyMismatch {
            subnet: subnet.name(),
            what: "nodes",
            expected: config.node_count,
            found: engine.node_count(),
        });
    }
    if engine.vc_count() != config.vc_count {
        return Err(Error::TopologyMismatch {
            subnet: subnet.name(),
            what: "virtual channels",
            expected: config.vc_count,
            found: engine.vc_count(),
        });
    }
    Ok(())
}

impl<M: SubnetworkEngine, T: SubnetworkEngine> CompositeNetwork<M, T> {
    pub fn new(config: &NetworkConfiguration, mesh: M, tree: T) -> Result<Self, Error> {
        config.validate()?;
        check_engine(Subnet::Mesh, &mesh, config)?;
        check_engine(Subnet::Tree, &tree, config)?;
        log::debug!(
            "composite of {} and {}: {} nodes, {} vcs, {} injection",
            mesh.name(),
            tree.name(),
            config.node_count,
            config.vc_count,
            config.injection_policy
        );
        Ok(Self {
            node_count: config.node_count,
            vc_count: config.vc_count,
            engines: SubnetPair::new(mesh, tree),
            binder: PacketBinder::new(),
            injection: InjectionRouter::new(config.injection_policy, config.seed),
            latency: LatencyPredictor::new(),
            egress: EgressMultiplexer::new(config.node_count, config.vc_count),
            credits: CreditRouter::new(config.node_count),
        })
    }

    pub fn mesh(&self) -> &M {
        &self.engines.mesh
    }

    pub fn tree(&self) -> &T {
        &self.engines.tree
    }

    pub fn policy(&self) -> InjectionPolicy {
        self.injection.policy()
    }

    pub fn latency_estimates(&self) -> [Cycle; SUBNET_COUNT] {
        self.latency.estimates()
    }

    /// Packets whose tail flit has not been injected yet.
    pub fn bound_packets(&self) -> usize {
        self.binder.len()
    }

    /// Flits ejected by the subnetworks but not yet emitted at `dest`.
    pub fn pending(&self, dest: usize) -> Result<usize, Error> {
        self.check_node(dest)?;
        Ok(self.egress.pending(dest))
    }

    fn check_node(&self, node: usize) -> Result<(), Error> {
        if node < self.node_count {
            Ok(())
        } else {
            Err(Error::OutOfRange {
                node,
                node_count: self.node_count,
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

    /// Injects `flit` at `source` and returns the subnetwork carrying it.
    pub fn accept_flit(&mut self, flit: Flit, source: usize) -> Result<Subnet, Error> {
        self.check_node(source)?;
        self.check_node(flit.dest)?;
        self.check_vc(flit.vc)?;
        let subnet = if flit.head {
            if self.binder.is_bound(flit.pid) {
                return Err(Error::AlreadyBound(flit.pid));
            }
            self.injection.choose_subnet(source, &self.latency)
        } else {
            self.binder.lookup(flit.pid)?
        };
        let (pid, head, tail) = (flit.pid, flit.head, flit.tail);
        log::trace!("accept at {} into {}: {}", source, subnet, flit);
        // the binder only changes once the subnetwork has taken the flit
        self.engines.get_mut(subnet).flit_in(flit, source)?;
        self.credits.record_acceptance(source, subnet);
        match (head, tail) {
            (true, false) => self.binder.bind(pid, subnet)?,
            (false, true) => {
                self.binder.release(pid);
            }
            _ => {}
        }
        Ok(subnet)
    }

    /// Drains at most one flit from each subnetwork at `dest` and serves the
    /// next flit of the merged stream.
    pub fn emit_flit(&mut self, dest: usize) -> Result<Option<Flit>, Error> {
        self.check_node(dest)?;
        for &subnet in Subnet::ALL.iter() {
            if let Some(flit) = self.engines.get_mut(subnet).flit_out(dest)? {
                self.egress.ingest(subnet, dest, flit)?;
            }
        }
        match self.egress.serve(dest) {
            Some((subnet, flit)) => {
                self.credits.record_delivery(dest, subnet);
                self.latency.record(subnet, &flit);
                Ok(Some(flit))
            }
            None => Ok(None),
        }
    }

    /// Returns an ejection credit at `dest` to the subnetwork that delivered
    /// the last flit there.
    pub fn send_credit(&mut self, credit: Credit, dest: usize) -> Result<Subnet, Error> {
        self.check_node(dest)?;
        self.check_vc(credit.vc)?;
        self.credits.return_credit(&mut self.engines, dest, credit)
    }

    /// Polls for an injection credit at `source` from the subnetwork that
    /// accepted the last flit there.
    pub fn receive_credit(&mut self, source: usize) -> Result<Option<Credit>, Error> {
        self.check_node(source)?;
        self.credits.request_credit(&mut self.engines, source)
    }
}

impl<M, T> CompositeNetwork<M, T>
where
    M: SubnetworkEngine + HopRouting,
    T: SubnetworkEngine + HopRouting,
{
    /// Per-hop routing for a router of `request.subnet`, answered by that
    /// subnetwork. The composite itself only decides at injection.
    pub fn route(&self, request: &RouteRequest<'_>) -> Result<Hop, Error> {
        self.engines
            .next_hop(request.subnet, request.vertex, request.flit)
    }

    pub fn register_routing_functions(table: &mut RoutingTable<Self>) -> Result<(), Error> {
        table.register(COMPOSITE_ROUTING, composite_routing::<M, T>)
    }
}

fn composite_routing<M, T>(
    network: &CompositeNetwork<M, T>,
    request: &RouteRequest<'_>,
) -> Result<Hop, Error>
where
    M: SubnetworkEngine + HopRouting,
    T: SubnetworkEngine + HopRouting,
{
    network.route(request)
}

impl<M: SubnetworkEngine, T: SubnetworkEngine> SubnetworkEngine for CompositeNetwork<M, T> {
    fn name(&self) -> &str {
        "composite"
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn vc_count(&self) -> usize {
        self.vc_count
    }

    fn flit_in(&mut self, flit: Flit, source: usize) -> Result<(), Error> {
        self.accept_flit(flit, source).map(|_| ())
    }

    fn flit_out(&mut self, dest: usize) -> Result<Option<Flit>, Error> {
        self.emit_flit(dest)
    }

    fn credit_in(&mut self, credit: Credit, dest: usize) -> Result<(), Error> {
        self.send_credit(credit, dest).map(|_| ())
    }

    fn credit_out(&mut self, source: usize) -> Result<Option<Credit>, Error> {
        self.receive_credit(source)
    }

    fn sample_inputs(&mut self) {
        self.engines.mesh.sample_inputs();
        self.engines.tree.sample_inputs();
    }

    fn evaluate(&mut self) {
        self.engines.mesh.evaluate();
        self.engines.tree.evaluate();
    }

    fn commit_outputs(&mut self) {
        self.engines.mesh.commit_outputs();
        self.engines.tree.commit_outputs();
    }
}
