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

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::latency::LatencyPredictor;
use crate::{Error, Subnet};

/// How the head flit of a packet picks its subnetwork.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionPolicy {
    /// Subnetwork `source mod 2`.
    FixedParity,
    /// Uniform draw from the seeded simulation stream.
    Oblivious,
    /// Subnetwork with the lower latency estimate, ties go to the mesh.
    ///
    /// Only the most recent sample of each subnetwork is considered, not
    /// queue occupancy, so under symmetric load the choice can oscillate.
    Adaptive,
}

impl Default for InjectionPolicy {
    fn default() -> Self {
        InjectionPolicy::FixedParity
    }
}

impl fmt::Display for InjectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            InjectionPolicy::FixedParity => "fixed-parity",
            InjectionPolicy::Oblivious => "oblivious",
            InjectionPolicy::Adaptive => "adaptive",
        })
    }
}

impl FromStr for InjectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed-parity" => Ok(InjectionPolicy::FixedParity),
            "oblivious" => Ok(InjectionPolicy::Oblivious),
            "adaptive" => Ok(InjectionPolicy::Adaptive),
            _ => Err(Error::InvalidConfiguration(format!(
                "unknown injection policy {}",
                s
            ))),
        }
    }
}

/// Picks the subnetwork of every new packet.
pub struct InjectionRouter {
    policy: InjectionPolicy,
    /// Only drawn from by the oblivious policy.
    rng: Xoshiro256StarStar,
}

impl InjectionRouter {
    pub fn new(policy: InjectionPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    pub fn policy(&self) -> InjectionPolicy {
        self.policy
    }

    pub fn choose_subnet(&mut self, source: usize, latency: &LatencyPredictor) -> Subnet {
        let subnet = match self.policy {
            InjectionPolicy::FixedParity => Subnet::from_index(source),
            InjectionPolicy::Oblivious => Subnet::from_index(self.rng.gen_range(0..2)),
            InjectionPolicy::Adaptive => {
                if latency.estimate(Subnet::Tree) < latency.estimate(Subnet::Mesh) {
                    Subnet::Tree
                } else {
                    Subnet::Mesh
                }
            }
        };
        log::trace!(
            "{} injection from node {} picks {}",
            self.policy,
            source,
            subnet
        );
        subnet
    }
}

impl fmt::Debug for InjectionRouter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InjectionRouter")
            .field("policy", &self.policy)
            .finish()
    }
}
