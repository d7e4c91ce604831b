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

use bencher::Bencher;
use bencher::{benchmark_group, benchmark_main};

use netsim::*;

/// Injects one 4-flit packet per node and cycles the network until every flit
/// has been emitted.
fn all_to_neighbour(bench: &mut Bencher, policy: InjectionPolicy) {
    let config = NetworkConfiguration {
        injection_policy: policy,
        ..Default::default()
    };
    bench.iter(|| {
        let mut net = CompositeNetwork::from_config(&config).unwrap();
        let nodes = net.node_count();
        let mut remaining = 0;
        for source in 0..nodes {
            for flit in Flit::packet(source, source, (source + 5) % nodes, source % 2, 4, 0) {
                net.accept_flit(flit, source).unwrap();
                remaining += 1;
            }
        }
        while remaining > 0 {
            net.step();
            for dest in 0..nodes {
                if let Some(flit) = net.emit_flit(dest).unwrap() {
                    net.send_credit(Credit::new(flit.vc), dest).unwrap();
                    remaining -= 1;
                }
            }
        }
        net.latency_estimates()
    });
}

fn fixed_parity(bench: &mut Bencher) {
    all_to_neighbour(bench, InjectionPolicy::FixedParity);
}

fn adaptive(bench: &mut Bencher) {
    all_to_neighbour(bench, InjectionPolicy::Adaptive);
}

benchmark_group!(benches, fixed_parity, adaptive);
benchmark_main!(benches);
