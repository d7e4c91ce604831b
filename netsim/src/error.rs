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

use crate::PacketId;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    OutOfRange { node: usize, node_count: usize },
    InvalidVirtualChannel { vc: usize, vc_count: usize },
    UnknownPacket(PacketId),
    AlreadyBound(PacketId),
    NoDeliveryRecorded(usize),
    NoAcceptanceRecorded(usize),
    TopologyMismatch {
        subnet: &'static str,
        what: &'static str,
        expected: usize,
        found: usize,
    },
    InvalidConfiguration(String),
    DuplicateRoutingFunction(String),
    UnknownRoutingFunction(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutOfRange { node, node_count } => {
                write!(
                    f,
                    "ERROR: node {} out of range (network has {} nodes)",
                    node, node_count
                )
            }
            Self::InvalidVirtualChannel { vc, vc_count } => {
                write!(
                    f,
                    "ERROR: virtual channel {} out of range ({} configured)",
                    vc, vc_count
                )
            }
            Self::UnknownPacket(pid) => {
                write!(f, "ERROR: flit of packet {} arrived without its head", pid)
            }
            Self::AlreadyBound(pid) => {
                write!(f, "ERROR: packet {} is already bound to a subnetwork", pid)
            }
            Self::NoDeliveryRecorded(node) => {
                write!(f, "ERROR: credit for node {} before any delivery", node)
            }
            Self::NoAcceptanceRecorded(node) => {
                write!(f, "ERROR: credit from node {} before any injection", node)
            }
            Self::TopologyMismatch {
                subnet,
                what,
                expected,
                found,
            } => {
                write!(
                    f,
                    "ERROR: {} subnetwork has {} {} where {} were configured",
                    subnet, found, what, expected
                )
            }
            Self::InvalidConfiguration(reason) => {
                write!(f, "ERROR: invalid configuration: {}", reason)
            }
            Self::DuplicateRoutingFunction(name) => {
                write!(f, "ERROR: routing function {} registered twice", name)
            }
            Self::UnknownRoutingFunction(name) => {
                write!(f, "ERROR: no routing function named {}", name)
            }
        }
    }
}

impl std::error::Error for Error {}
