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

use crate::{Cycle, Flit, Subnet, SUBNET_COUNT};

/// Last observed packet latency per subnetwork.
///
/// Every tail flit served at its destination replaces the estimate of the
/// subnetwork that carried it; there is no averaging, so a single slow packet
/// moves the estimate all the way.
#[derive(Clone, Debug, Default)]
pub struct LatencyPredictor {
    estimates: [Cycle; SUBNET_COUNT],
}

impl LatencyPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, subnet: Subnet, flit: &Flit) {
        if !flit.tail {
            return;
        }
        match flit.latency() {
            Some(latency) => {
                log::trace!("{} latency sample {} from {}", subnet, latency, flit);
                self.estimates[subnet.index()] = latency;
            }
            None => log::warn!("{} delivered {} without an arrival time", subnet, flit),
        }
    }

    pub fn estimate(&self, subnet: Subnet) -> Cycle {
        self.estimates[subnet.index()]
    }

    pub fn estimates(&self) -> [Cycle; SUBNET_COUNT] {
        self.estimates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(ctime: Cycle, atime: Cycle, tail: bool) -> Flit {
        let mut flit = Flit::new(0, 0, 0, 1, 0).created_at(ctime);
        flit.tail = tail;
        flit.atime = Some(atime);
        flit
    }

    #[test]
    fn test_tail_replaces_estimate() {
        let mut predictor = LatencyPredictor::new();
        assert_eq!(predictor.estimates(), [0, 0]);
        predictor.record(Subnet::Tree, &delivered(10, 40, true));
        assert_eq!(predictor.estimate(Subnet::Tree), 30);
        predictor.record(Subnet::Tree, &delivered(50, 55, true));
        assert_eq!(predictor.estimate(Subnet::Tree), 5);
        assert_eq!(predictor.estimate(Subnet::Mesh), 0);
    }

    #[test]
    fn test_non_tail_ignored() {
        let mut predictor = LatencyPredictor::new();
        predictor.record(Subnet::Mesh, &delivered(0, 100, false));
        assert_eq!(predictor.estimate(Subnet::Mesh), 0);

        let mut unstamped = Flit::new(0, 0, 0, 1, 0).tail();
        unstamped.ctime = 3;
        predictor.record(Subnet::Mesh, &unstamped);
        assert_eq!(predictor.estimate(Subnet::Mesh), 0);
    }
}
