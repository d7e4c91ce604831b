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

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{Cycle, Error, InjectionPolicy};

/// Seed of the simulation's random stream when none is configured.
pub const DEFAULT_SEED: u64 = 0x07654321FEDCBA09u64;

/// Per-subnetwork link and buffer parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkConfiguration {
    /// Cycles to cross one router-to-router link.
    pub latency: Cycle,
    /// Ejection buffer slots per (node, VC).
    pub buffer_depth: usize,
}

impl Default for LinkConfiguration {
    fn default() -> Self {
        Self {
            latency: 1,
            buffer_depth: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MeshConfiguration {
    pub dims: Vec<usize>,
    #[serde(default)]
    pub link: LinkConfiguration,
}

impl Default for MeshConfiguration {
    fn default() -> Self {
        Self {
            dims: vec![4, 4],
            link: LinkConfiguration::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TreeConfiguration {
    pub height: usize,
    #[serde(default)]
    pub link: LinkConfiguration,
}

impl Default for TreeConfiguration {
    fn default() -> Self {
        Self {
            height: 4,
            link: LinkConfiguration::default(),
        }
    }
}

/// Parameters of a composite network.
///
/// Constructed programmatically or read from a YAML file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfiguration {
    pub node_count: usize,
    pub vc_count: usize,
    #[serde(default)]
    pub injection_policy: InjectionPolicy,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub mesh: MeshConfiguration,
    #[serde(default)]
    pub tree: TreeConfiguration,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for NetworkConfiguration {
    fn default() -> Self {
        Self {
            node_count: 16,
            vc_count: 2,
            injection_policy: InjectionPolicy::default(),
            seed: DEFAULT_SEED,
            mesh: MeshConfiguration::default(),
            tree: TreeConfiguration::default(),
        }
    }
}

impl NetworkConfiguration {
    pub fn from_file<P: AsRef<Path>>(file_name: P) -> anyhow::Result<Self> {
        let path = file_name.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(config: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(config).context("parsing network configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that do not depend on the subnetworks. Node counts
    /// are checked against the subnetworks when the network is built.
    pub fn validate(&self) -> Result<(), Error> {
        if self.node_count == 0 {
            return Err(Error::InvalidConfiguration(
                "node_count must be positive".to_string(),
            ));
        }
        if self.vc_count == 0 {
            return Err(Error::InvalidConfiguration(
                "vc_count must be positive".to_string(),
            ));
        }
        if self.mesh.dims.is_empty() || self.mesh.dims.contains(&0) {
            return Err(Error::InvalidConfiguration(format!(
                "invalid mesh dimensions {:?}",
                self.mesh.dims
            )));
        }
        if self.mesh_node_count().is_none() {
            return Err(Error::InvalidConfiguration(format!(
                "mesh dimensions {:?} overflow",
                self.mesh.dims
            )));
        }
        if self.tree_node_count().is_none() {
            return Err(Error::InvalidConfiguration(format!(
                "tree height {} overflows",
                self.tree.height
            )));
        }
        for (name, link) in [("mesh", &self.mesh.link), ("tree", &self.tree.link)] {
            if link.buffer_depth == 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{} buffer_depth must be positive",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Checks that the configured mesh and tree both have `node_count`
    /// terminals, before any of them is built.
    pub fn validate_topologies(&self) -> Result<(), Error> {
        self.validate()?;
        let sizes = [
            ("mesh", self.mesh_node_count()),
            ("tree", self.tree_node_count()),
        ];
        for &(subnet, nodes) in sizes.iter() {
            // both are known to fit after validate()
            let found = nodes.unwrap_or(usize::MAX);
            if found != self.node_count {
                return Err(Error::TopologyMismatch {
                    subnet,
                    what: "nodes",
                    expected: self.node_count,
                    found,
                });
            }
        }
        Ok(())
    }

    fn mesh_node_count(&self) -> Option<usize> {
        self.mesh
            .dims
            .iter()
            .try_fold(1usize, |nodes, &dim| nodes.checked_mul(dim))
    }

    fn tree_node_count(&self) -> Option<usize> {
        u32::try_from(self.tree.height)
            .ok()
            .and_then(|height| 2usize.checked_pow(height))
    }
}
