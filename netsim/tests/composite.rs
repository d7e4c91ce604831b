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

use std::collections::HashMap;

use netsim::*;

fn small_config(policy: InjectionPolicy) -> NetworkConfiguration {
    NetworkConfiguration {
        node_count: 8,
        vc_count: 2,
        injection_policy: policy,
        mesh: MeshConfiguration {
            dims: vec![4, 2],
            link: LinkConfiguration {
                latency: 1,
                buffer_depth: 2,
            },
        },
        tree: TreeConfiguration {
            height: 3,
            link: LinkConfiguration {
                latency: 2,
                buffer_depth: 2,
            },
        },
        ..Default::default()
    }
}

/// Steps `net` until `expected` flits were emitted, returning them per
/// destination in emission order. Every emitted flit's credit is returned
/// right away.
fn drain<E: SubnetworkEngine>(net: &mut E, expected: usize, limit: usize) -> Vec<Vec<Flit>> {
    let mut delivered = vec![Vec::new(); net.node_count()];
    let mut count = 0;
    for _ in 0..limit {
        net.step();
        for dest in 0..net.node_count() {
            if let Some(flit) = net.flit_out(dest).unwrap() {
                net.credit_in(Credit::new(flit.vc), dest).unwrap();
                delivered[dest].push(flit);
                count += 1;
            }
        }
        if count == expected {
            break;
        }
    }
    assert_eq!(count, expected, "not every flit came out");
    delivered
}

/// All-to-one and neighbour traffic: packets of `len` flits from every node.
fn inject_packets(net: &mut CompositeNetwork<GraphEngine, GraphEngine>, len: usize) -> usize {
    let nodes = net.node_count();
    let mut pid = 0;
    let mut flits = 0;
    for round in 0..3 {
        for source in 0..nodes {
            for dest in [0, (source + 1) % nodes] {
                for flit in Flit::packet(pid, source, dest, round % 2, len, 0) {
                    net.accept_flit(flit, source).unwrap();
                    flits += 1;
                }
                pid += 1;
            }
        }
    }
    flits
}

#[test]
fn packets_arrive_whole_and_in_order() -> anyhow::Result<()> {
    let _logger = env_logger::builder().is_test(true).try_init();
    let mut net = CompositeNetwork::from_config(&small_config(InjectionPolicy::FixedParity))?;
    let injected = inject_packets(&mut net, 4);
    assert_eq!(net.bound_packets(), 0);

    let delivered = drain(&mut net, injected, 500);
    for (dest, flits) in delivered.iter().enumerate() {
        // open packet per (subnetwork, vc); fixed parity puts a source on
        // subnetwork `source % 2`.
        let mut open: HashMap<(usize, usize), (PacketId, usize)> = HashMap::new();
        for flit in flits {
            assert_eq!(flit.dest, dest);
            let key = (flit.source % 2, flit.vc);
            match open.get(&key).copied() {
                Some((pid, next_id)) => {
                    assert_eq!(flit.pid, pid, "packet interleaved at {}", dest);
                    assert_eq!(flit.id, next_id);
                }
                None => {
                    assert!(flit.head);
                    assert_eq!(flit.id, 0);
                }
            }
            if flit.tail {
                open.remove(&key);
            } else {
                open.insert(key, (flit.pid, flit.id + 1));
            }
        }
        assert!(open.is_empty());
    }
    let [mesh, tree] = net.latency_estimates();
    assert!(mesh > 0 && tree > 0);
    Ok(())
}

#[test]
fn injection_credits_come_back() -> anyhow::Result<()> {
    let mut net = CompositeNetwork::from_config(&small_config(InjectionPolicy::FixedParity))?;
    let injected = inject_packets(&mut net, 2);
    drain(&mut net, injected, 500);
    let mut credits = 0;
    for source in 0..net.node_count() {
        while let Some(credit) = net.receive_credit(source)? {
            assert!(credit.vc < 2);
            credits += 1;
        }
    }
    assert_eq!(credits, injected);
    Ok(())
}

#[test]
fn single_packet_scenario() -> anyhow::Result<()> {
    let mut net = CompositeNetwork::from_config(&small_config(InjectionPolicy::FixedParity))?;
    let dest = 6;
    for flit in Flit::packet(7, 2, dest, 0, 3, 0) {
        assert_eq!(net.accept_flit(flit, 2)?, Subnet::Mesh);
    }
    let hops = net.mesh().hops(2, dest);
    let mut emitted = Vec::new();
    for _ in 0..20 {
        net.step();
        if let Some(flit) = net.emit_flit(dest)? {
            assert_eq!(net.send_credit(Credit::new(flit.vc), dest)?, Subnet::Mesh);
            emitted.push(flit);
        }
    }
    assert_eq!(emitted.iter().map(|f| f.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(emitted[0].head && emitted[2].tail);
    assert!(emitted.iter().all(|f| f.pid == 7 && f.hops == hops));
    let [mesh, tree] = net.latency_estimates();
    assert!(mesh >= hops);
    assert_eq!(tree, 0);
    Ok(())
}

#[test]
fn adaptive_moves_to_faster_subnet() -> anyhow::Result<()> {
    let mut net = CompositeNetwork::from_config(&small_config(InjectionPolicy::Adaptive))?;
    // first packet: no estimates yet, goes to the mesh
    let first = Flit::packet(0, 0, 7, 0, 1, 0).remove(0);
    assert_eq!(net.accept_flit(first, 0)?, Subnet::Mesh);
    drain(&mut net, 1, 100);
    assert!(net.latency_estimates()[0] > 0);
    // the tree has no sample, so it looks faster
    let second = Flit::packet(1, 0, 7, 0, 1, 0).remove(0);
    assert_eq!(net.accept_flit(second, 0)?, Subnet::Tree);
    Ok(())
}

#[test]
fn oblivious_is_reproducible() -> anyhow::Result<()> {
    let choices = |seed: u64| -> anyhow::Result<Vec<Subnet>> {
        let mut config = small_config(InjectionPolicy::Oblivious);
        config.seed = seed;
        let mut net = CompositeNetwork::from_config(&config)?;
        let mut chosen = Vec::new();
        for pid in 0..32 {
            let flit = Flit::packet(pid, pid % 8, 0, 0, 1, 0).remove(0);
            chosen.push(net.accept_flit(flit, pid % 8)?);
        }
        Ok(chosen)
    };
    assert_eq!(choices(DEFAULT_SEED)?, choices(DEFAULT_SEED)?);
    assert_ne!(choices(1)?, choices(2)?);
    Ok(())
}

#[test]
fn composite_substitutes_for_a_subnetwork() -> anyhow::Result<()> {
    let config = small_config(InjectionPolicy::FixedParity);
    let mut alone = GraphEngine::mesh(&config.mesh, config.vc_count);
    let mut composite = CompositeNetwork::from_config(&config)?;
    for net in [
        &mut alone as &mut dyn SubnetworkEngine,
        &mut composite as &mut dyn SubnetworkEngine,
    ] {
        for flit in Flit::packet(3, 4, 1, 1, 2, 0) {
            net.flit_in(flit, 4)?;
        }
    }
    let alone = drain(&mut alone, 2, 50);
    let composite = drain(&mut composite, 2, 50);
    let ids = |flits: &Vec<Flit>| flits.iter().map(|f| (f.pid, f.id)).collect::<Vec<_>>();
    assert_eq!(ids(&alone[1]), ids(&composite[1]));
    Ok(())
}

#[test]
fn topology_mismatch_fails_construction() {
    let mut config = small_config(InjectionPolicy::FixedParity);
    config.tree.height = 2;
    assert_eq!(
        CompositeNetwork::from_config(&config).err(),
        Some(Error::TopologyMismatch {
            subnet: "tree",
            what: "nodes",
            expected: 8,
            found: 4,
        })
    );
    config.tree.height = 3;
    config.mesh.dims = vec![3, 3];
    assert!(matches!(
        CompositeNetwork::from_config(&config).err(),
        Some(Error::TopologyMismatch { subnet: "mesh", .. })
    ));
}

#[test]
fn routing_is_delegated_to_the_carrying_subnet() -> anyhow::Result<()> {
    let net = CompositeNetwork::from_config(&small_config(InjectionPolicy::FixedParity))?;
    let mut table = RoutingTable::<CompositeNetwork<GraphEngine, GraphEngine>>::new();
    CompositeNetwork::register_routing_functions(&mut table)?;
    assert_eq!(
        CompositeNetwork::register_routing_functions(&mut table),
        Err(Error::DuplicateRoutingFunction(COMPOSITE_ROUTING.to_string()))
    );

    let flit = Flit::packet(0, 0, 7, 0, 1, 0).remove(0);
    for (subnet, start, hops) in [
        (
            Subnet::Mesh,
            net.mesh().topology().terminal(0).index(),
            net.mesh().hops(0, 7),
        ),
        (
            Subnet::Tree,
            net.tree().topology().terminal(0).index(),
            net.tree().hops(0, 7),
        ),
    ] {
        let mut vertex = start;
        let mut taken = 0;
        loop {
            let request = RouteRequest {
                subnet,
                vertex,
                flit: &flit,
            };
            match table.route(COMPOSITE_ROUTING, &net, &request)? {
                Hop::Forward(next) => {
                    vertex = next;
                    taken += 1;
                }
                Hop::Eject => break,
            }
        }
        assert_eq!(taken, hops);
    }
    Ok(())
}

#[test]
fn configuration_from_file() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("netsim-config-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "node_count: 8\nvc_count: 2\ninjection_policy: oblivious\nmesh:\n  dims: [2, 4]\ntree:\n  height: 3\n",
    )?;
    let config = NetworkConfiguration::from_file(&path);
    std::fs::remove_file(&path)?;
    let config = config?;
    assert_eq!(config.injection_policy, InjectionPolicy::Oblivious);
    let net = CompositeNetwork::from_config(&config)?;
    assert_eq!(net.policy(), InjectionPolicy::Oblivious);
    assert!(NetworkConfiguration::from_file(std::env::temp_dir().join("netsim-missing.yaml")).is_err());
    Ok(())
}
