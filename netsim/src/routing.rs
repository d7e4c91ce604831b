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

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::engine::Hop;
use crate::{Error, Flit, Subnet};

/// A per-hop routing question asked by a router of one of the subnetworks.
#[derive(Clone, Copy, Debug)]
pub struct RouteRequest<'a> {
    /// Subnetwork the asking router belongs to.
    pub subnet: Subnet,
    /// Topology vertex of the asking router.
    pub vertex: usize,
    pub flit: &'a Flit,
}

pub type RoutingFunction<N> = fn(&N, &RouteRequest<'_>) -> Result<Hop, Error>;

/// Named routing functions, filled in once at start-up by the networks that
/// provide them and looked up by the router layer.
pub struct RoutingTable<N> {
    functions: BTreeMap<String, RoutingFunction<N>>,
}

impl<N> RoutingTable<N> {
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Registering a name twice is an initialization error; the first
    /// registration is kept.
    pub fn register(&mut self, name: &str, function: RoutingFunction<N>) -> Result<(), Error> {
        match self.functions.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateRoutingFunction(name.to_string())),
            Entry::Vacant(entry) => {
                log::debug!("register routing function {}", name);
                entry.insert(function);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<RoutingFunction<N>, Error> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownRoutingFunction(name.to_string()))
    }

    /// Resolves `name` and applies it to `request`.
    pub fn route(&self, name: &str, network: &N, request: &RouteRequest<'_>) -> Result<Hop, Error> {
        let function = self.lookup(name)?;
        function(network, request)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl<N> Default for RoutingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
