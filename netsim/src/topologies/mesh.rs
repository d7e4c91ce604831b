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

use super::{delinearize_index, linearize_index, Topology};
use itertools::Itertools;

/// A <dim>-D grid topology with one router per node.
///
/// Node `n` sits at the grid coordinates `delinearize_index(n, dims)`, and
/// every router links to its neighbours along each dimension.
///
/// For example a 2D mesh looks like this:
/// <pre>
/// x --- x --- x --- x   ^
/// |     |     |     |   |
/// x --- x --- x --- x   y-dim
/// |     |     |     |   |
/// x --- x --- x --- x   v
/// < ----- x-dim ---->
/// </pre>
pub fn mesh(dims: &[usize]) -> Topology {
    assert!(
        !dims.is_empty() && dims.iter().all(|&d| d > 0),
        "mesh dimensions must be positive: {:?}",
        dims
    );
    let mut topo = Topology::new();
    let nodes = (0..dims.iter().product::<usize>())
        .map(|n| {
            log::trace!("mesh node {}, coords {:?}", n, delinearize_index(n, dims));
            topo.add_terminal()
        })
        .collect::<Vec<_>>();

    // for each node, add the connections to their "higher" neighbours.
    for e in dims.iter().map(|&d| 0..d).multi_cartesian_product() {
        for (d, &m) in dims.iter().enumerate() {
            if e[d] + 1 < m {
                let mut n = e.clone();
                n[d] = e[d] + 1;
                topo.link(
                    nodes[linearize_index(&e, dims)],
                    nodes[linearize_index(&n, dims)],
                );
            }
        }
    }
    topo
}
