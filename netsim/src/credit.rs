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

use crate::engine::{SubnetPair, SubnetworkEngine};
use crate::{Credit, Error, Subnet};

/// Sends credits to the subnetwork that carried the matching flit.
///
/// The two directions are tracked separately: egress credits follow the
/// subnetwork that last delivered a flit *to* a destination, injection credits
/// come from the subnetwork that last accepted a flit *from* a source.
#[derive(Debug)]
pub struct CreditRouter {
    last_delivered: Vec<Option<Subnet>>,
    last_accepted: Vec<Option<Subnet>>,
}

impl CreditRouter {
    pub fn new(node_count: usize) -> Self {
        Self {
            last_delivered: vec![None; node_count],
            last_accepted: vec![None; node_count],
        }
    }

    pub fn record_delivery(&mut self, dest: usize, subnet: Subnet) {
        self.last_delivered[dest] = Some(subnet);
    }

    pub fn record_acceptance(&mut self, source: usize, subnet: Subnet) {
        self.last_accepted[source] = Some(subnet);
    }

    pub fn last_delivered(&self, dest: usize) -> Result<Subnet, Error> {
        self.last_delivered[dest].ok_or(Error::NoDeliveryRecorded(dest))
    }

    pub fn last_accepted(&self, source: usize) -> Result<Subnet, Error> {
        self.last_accepted[source].ok_or(Error::NoAcceptanceRecorded(source))
    }

    /// Forwards an ejection-buffer credit freed at `dest`. Returns the
    /// subnetwork that received it.
    pub fn return_credit<M, T>(
        &self,
        engines: &mut SubnetPair<M, T>,
        dest: usize,
        credit: Credit,
    ) -> Result<Subnet, Error>
    where
        M: SubnetworkEngine,
        T: SubnetworkEngine,
    {
        let subnet = self.last_delivered(dest)?;
        log::trace!("credit vc {} at node {} returns to {}", credit.vc, dest, subnet);
        engines.get_mut(subnet).credit_in(credit, dest)?;
        Ok(subnet)
    }

    /// Polls the injection-credit channel of `source`.
    pub fn request_credit<M, T>(
        &self,
        engines: &mut SubnetPair<M, T>,
        source: usize,
    ) -> Result<Option<Credit>, Error>
    where
        M: SubnetworkEngine,
        T: SubnetworkEngine,
    {
        let subnet = self.last_accepted(source)?;
        engines.get_mut(subnet).credit_out(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_are_independent() {
        let mut router = CreditRouter::new(4);
        assert_eq!(router.last_delivered(2), Err(Error::NoDeliveryRecorded(2)));
        assert_eq!(router.last_accepted(2), Err(Error::NoAcceptanceRecorded(2)));

        router.record_acceptance(2, Subnet::Tree);
        assert_eq!(router.last_accepted(2), Ok(Subnet::Tree));
        // accepting from node 2 says nothing about deliveries to node 2
        assert_eq!(router.last_delivered(2), Err(Error::NoDeliveryRecorded(2)));

        router.record_delivery(2, Subnet::Mesh);
        router.record_delivery(2, Subnet::Tree);
        router.record_delivery(2, Subnet::Mesh);
        assert_eq!(router.last_delivered(2), Ok(Subnet::Mesh));
        assert_eq!(router.last_accepted(2), Ok(Subnet::Tree));
    }
}
