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

use super::Topology;
use petgraph::prelude::*;

/// A binary tree of height H whose leaves are the network's nodes.
///
/// The root is at level H, its children at level H - 1, and so forth down to
/// the terminals at level 0. All levels above 0 are switches. A tree of height
/// H has 2^H terminals and 2^H - 1 switches; height 0 is a single terminal.
///
/// Example H = 2:
///
///```text
///               switch_0_2                L = 2
///              /          \
///        switch_0_1     switch_1_1        L = 1
///         /     \        /     \
///    node_0  node_1  node_2  node_3       L = 0
///```
/// Terminals are numbered left to right.
pub fn tree(height: usize) -> Topology {
    struct GenerateCounters {
        level: usize,
        index: usize,
    }

    impl GenerateCounters {
        fn left(&self) -> Self {
            GenerateCounters {
                level: self.level - 1,
                index: 2 * self.index,
            }
        }

        fn right(&self) -> Self {
            GenerateCounters {
                level: self.level - 1,
                index: 2 * self.index + 1,
            }
        }
    }

    fn tree_rec(topo: &mut Topology, counters: GenerateCounters) -> NodeIndex {
        if counters.level == 0 {
            return topo.add_terminal();
        }
        // children first so terminals get numbered left to right
        let left_child = tree_rec(topo, counters.left());
        let right_child = tree_rec(topo, counters.right());
        let parent = topo.add_switch(counters.index, counters.level);
        topo.link(left_child, parent);
        topo.link(right_child, parent);
        parent
    }

    let mut topo = Topology::new();
    tree_rec(
        &mut topo,
        GenerateCounters {
            level: height,
            index: 0,
        },
    );
    topo
}
