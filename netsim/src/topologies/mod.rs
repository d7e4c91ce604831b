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

use petgraph::algo::dijkstra;
use petgraph::prelude::*;
use std::fmt;

mod mesh;
mod tree;

pub use mesh::mesh;
pub use tree::tree;

/// A router of a topology graph. Terminals are the routers the network's
/// nodes inject into and eject from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Vertex {
    Terminal(usize),
    Switch { index: usize, level: usize },
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Vertex::Terminal(node) => write!(f, "node_{}", node),
            Vertex::Switch { index, level } => write!(f, "switch_{}_{}", index, level),
        }
    }
}

/// Router graph of a subnetwork. Links are bidirectional and uniform.
#[derive(Clone, Debug)]
pub struct Topology {
    graph: UnGraph<Vertex, ()>,
    /// Vertex of each network node, indexed by node.
    terminals: Vec<NodeIndex>,
}

impl Topology {
    fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            terminals: Vec::new(),
        }
    }

    fn add_terminal(&mut self) -> NodeIndex {
        let vertex = self.graph.add_node(Vertex::Terminal(self.terminals.len()));
        self.terminals.push(vertex);
        vertex
    }

    fn add_switch(&mut self, index: usize, level: usize) -> NodeIndex {
        self.graph.add_node(Vertex::Switch { index, level })
    }

    fn link(&mut self, a: NodeIndex, b: NodeIndex) {
        self.graph.update_edge(a, b, ());
    }

    pub fn node_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn terminal(&self, node: usize) -> NodeIndex {
        self.terminals[node]
    }

    pub fn vertex(&self, vertex: NodeIndex) -> &Vertex {
        &self.graph[vertex]
    }

    pub fn neighbors(&self, vertex: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(vertex)
    }

    /// Hop distance from every vertex to the terminal of `node`, indexed by
    /// vertex.
    pub fn distances_to(&self, node: usize) -> Vec<usize> {
        let costs = dijkstra(&self.graph, self.terminals[node], None, |_| 1usize);
        self.graph
            .node_indices()
            .map(|vertex| costs.get(&vertex).copied().unwrap_or(usize::MAX))
            .collect()
    }
}

/// return the linear index of the element in a multi-dimensional grid
/// The element is represented as a vector of coordinates in `dims`.
fn linearize_index(elem: &[usize], dims: &[usize]) -> usize {
    let mut index: usize = 0;
    for (d, c) in elem.iter().enumerate() {
        index += c * dims[0..d].iter().product::<usize>();
    }
    index
}

/// given a linear index of the element, return the vector of coordinates in a
/// multi-dimensional grid of `dims` dimensions.
fn delinearize_index(index: usize, dims: &[usize]) -> Vec<usize> {
    let mut idx = index;
    let mut elem = vec![0; dims.len()];

    for (d, m) in dims.iter().enumerate().rev() {
        let prod = dims[0..d].iter().product::<usize>();
        if d == 0 {
            elem[d] = idx % m;
        } else {
            elem[d] = idx / prod;
            idx -= elem[d] * prod;
        }
    }
    elem
}
