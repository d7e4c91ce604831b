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

//! Composite interconnection network: one network interface over a mesh and a
//! tree subnetwork, simulated cycle by cycle.

mod binder;
mod composite;
mod config;
mod credit;
mod egress;
mod engine;
mod error;
mod flit;
mod graph_engine;
mod injection;
mod latency;
mod routing;
pub mod topologies;

// type to use for cycles
pub type Cycle = usize;

pub use crate::binder::PacketBinder;
pub use crate::composite::{CompositeNetwork, COMPOSITE_ROUTING};
pub use crate::config::{
    LinkConfiguration, MeshConfiguration, NetworkConfiguration, TreeConfiguration, DEFAULT_SEED,
};
pub use crate::credit::CreditRouter;
pub use crate::egress::{EgressMultiplexer, NetAndVc};
pub use crate::engine::{Hop, HopRouting, SubnetPair, SubnetworkEngine};
pub use crate::error::Error;
pub use crate::flit::{Credit, Flit, PacketId, Subnet, SUBNET_COUNT};
pub use crate::graph_engine::GraphEngine;
pub use crate::injection::{InjectionPolicy, InjectionRouter};
pub use crate::latency::LatencyPredictor;
pub use crate::routing::{RouteRequest, RoutingFunction, RoutingTable};
