// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Flow keys.

use core::fmt;
use core::fmt::Display;
use core::hash::Hash;
use crc32fast::Hasher;
use dplane_api::IpAddr;
use dplane_api::Ipv4Addr;
use dplane_api::Ipv6Addr;
use dplane_api::MacAddr;
use dplane_api::Protocol;
use serde::Deserialize;
use serde::Serialize;

pub static FLOW_KEY_DEFAULT: FlowKey = FlowKey {
    in_port: 0,
    eth_src: MacAddr::ZERO,
    eth_dst: MacAddr::ZERO,
    ether_type: 0,
    vlan_tci: 0,
    addrs: AddrPair::V4 { src: Ipv4Addr::ANY_ADDR, dst: Ipv4Addr::ANY_ADDR },
    proto: Protocol::Unknown(255),
    src_port: 0,
    dst_port: 0,
};

/// A source-destination pair of addresses of matching IP version.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum AddrPair {
    V4 { src: Ipv4Addr, dst: Ipv4Addr },
    V6 { src: Ipv6Addr, dst: Ipv6Addr },
}

impl AddrPair {
    /// Swap the source and destination addresses.
    pub fn mirror(self) -> Self {
        match self {
            Self::V4 { src, dst } => Self::V4 { src: dst, dst: src },
            Self::V6 { src, dst } => Self::V6 { src: dst, dst: src },
        }
    }
}

/// The flow key.
///
/// The fields a packet was classified on when its flow was looked
/// up. The engine never re-derives this from the packet. It is
/// carried alongside so an upcall can report the flow as classified
/// even after earlier actions have rewritten the packet, and so
/// consumers can use it to de-duplicate upcalls per flow.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FlowKey {
    pub in_port: u32,
    pub eth_src: MacAddr,
    pub eth_dst: MacAddr,
    pub ether_type: u16,
    pub vlan_tci: u16,
    pub addrs: AddrPair,
    pub proto: Protocol,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FlowKey {
    pub fn src_ip(&self) -> IpAddr {
        match self.addrs {
            AddrPair::V4 { src, .. } => src.into(),
            AddrPair::V6 { src, .. } => src.into(),
        }
    }

    pub fn dst_ip(&self) -> IpAddr {
        match self.addrs {
            AddrPair::V4 { dst, .. } => dst.into(),
            AddrPair::V6 { dst, .. } => dst.into(),
        }
    }

    /// The key for the same flow headed the other way.
    pub fn mirror(self) -> Self {
        Self {
            in_port: self.in_port,
            eth_src: self.eth_dst,
            eth_dst: self.eth_src,
            ether_type: self.ether_type,
            vlan_tci: self.vlan_tci,
            addrs: self.addrs.mirror(),
            proto: self.proto,
            src_port: self.dst_port,
            dst_port: self.src_port,
        }
    }

    /// A fixed-width digest of the key, cheap enough for probes and
    /// log lines.
    pub fn crc32(&self) -> u32 {
        let mut hasher = Hasher::new();
        self.hash(&mut hasher);
        hasher.finalize()
    }
}

impl Default for FlowKey {
    fn default() -> Self {
        FLOW_KEY_DEFAULT
    }
}

impl Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.proto,
            self.src_ip(),
            self.src_port,
            self.dst_ip(),
            self.dst_port,
        )
    }
}
