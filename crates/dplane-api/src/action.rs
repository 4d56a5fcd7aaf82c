// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The action-list wire contract.
//!
//! A compiled flow carries its actions as a flat buffer of
//! netlink-style attributes: a 16-bit length (which includes the
//! 4-byte header), a 16-bit type, the payload, then zero padding out
//! to a 4-byte boundary. Nested lists (`Set`, `Sample`, `Upcall`) are
//! attributes whose payload is itself a sequence of attributes.
//!
//! This module pins down the half of the contract both sides must
//! agree on: the discriminant numbering and the fixed payload shapes.
//! The framing itself lives with the datapath's attribute reader and
//! writer.
//!
//! Scalar payloads follow the netlink convention: counters and ids
//! (output port, sample probability) are native-endian u32; values
//! copied onto the wire (ethertypes, ports, label stack entries) are
//! big-endian.

use crate::ip::Ipv4Addr;
use crate::ip::Ipv6Addr;
use crate::mac::MacAddr;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Unaligned;

pub const ACTION_UNSPEC: u16 = 0;
pub const ACTION_OUTPUT: u16 = 1;
pub const ACTION_UPCALL: u16 = 2;
pub const ACTION_SET: u16 = 3;
pub const ACTION_PUSH_VLAN: u16 = 4;
pub const ACTION_POP_VLAN: u16 = 5;
pub const ACTION_SAMPLE: u16 = 6;
pub const ACTION_PUSH_MPLS: u16 = 7;
pub const ACTION_POP_MPLS: u16 = 8;

/// A top-level action discriminant.
///
/// `Unspec` is reserved and never valid in a compiled list; the
/// `Unknown` variant stands in for every number past the defined
/// range.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionType {
    Unspec,
    Output,
    Upcall,
    Set,
    PushVlan,
    PopVlan,
    Sample,
    PushMpls,
    PopMpls,
    Unknown(u16),
}

impl From<u16> for ActionType {
    fn from(val: u16) -> Self {
        match val {
            ACTION_UNSPEC => Self::Unspec,
            ACTION_OUTPUT => Self::Output,
            ACTION_UPCALL => Self::Upcall,
            ACTION_SET => Self::Set,
            ACTION_PUSH_VLAN => Self::PushVlan,
            ACTION_POP_VLAN => Self::PopVlan,
            ACTION_SAMPLE => Self::Sample,
            ACTION_PUSH_MPLS => Self::PushMpls,
            ACTION_POP_MPLS => Self::PopMpls,
            _ => Self::Unknown(val),
        }
    }
}

impl From<ActionType> for u16 {
    fn from(at: ActionType) -> u16 {
        match at {
            ActionType::Unspec => ACTION_UNSPEC,
            ActionType::Output => ACTION_OUTPUT,
            ActionType::Upcall => ACTION_UPCALL,
            ActionType::Set => ACTION_SET,
            ActionType::PushVlan => ACTION_PUSH_VLAN,
            ActionType::PopVlan => ACTION_POP_VLAN,
            ActionType::Sample => ACTION_SAMPLE,
            ActionType::PushMpls => ACTION_PUSH_MPLS,
            ActionType::PopMpls => ACTION_POP_MPLS,
            ActionType::Unknown(val) => val,
        }
    }
}

pub const FIELD_UNSPEC: u16 = 0;
pub const FIELD_ENCAP: u16 = 1;
pub const FIELD_PRIORITY: u16 = 2;
pub const FIELD_IN_PORT: u16 = 3;
pub const FIELD_ETHERNET: u16 = 4;
pub const FIELD_VLAN: u16 = 5;
pub const FIELD_ETHERTYPE: u16 = 6;
pub const FIELD_IPV4: u16 = 7;
pub const FIELD_IPV6: u16 = 8;
pub const FIELD_TCP: u16 = 9;
pub const FIELD_UDP: u16 = 10;
pub const FIELD_ICMP: u16 = 11;
pub const FIELD_ICMPV6: u16 = 12;
pub const FIELD_ARP: u16 = 13;
pub const FIELD_ND: u16 = 14;
pub const FIELD_MARK: u16 = 15;
pub const FIELD_TUNNEL: u16 = 16;
pub const FIELD_MPLS: u16 = 17;

/// The field group named by a `Set` action's single nested attribute.
///
/// The numbering is shared with flow-key serialization, which is why
/// match-only groups (`Ethertype`, `Arp`, ...) have numbers here even
/// though they may never appear under `Set`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FieldType {
    Unspec,
    Encap,
    Priority,
    InPort,
    Ethernet,
    Vlan,
    Ethertype,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    Arp,
    Nd,
    Mark,
    Tunnel,
    Mpls,
    Unknown(u16),
}

impl From<u16> for FieldType {
    fn from(val: u16) -> Self {
        match val {
            FIELD_UNSPEC => Self::Unspec,
            FIELD_ENCAP => Self::Encap,
            FIELD_PRIORITY => Self::Priority,
            FIELD_IN_PORT => Self::InPort,
            FIELD_ETHERNET => Self::Ethernet,
            FIELD_VLAN => Self::Vlan,
            FIELD_ETHERTYPE => Self::Ethertype,
            FIELD_IPV4 => Self::Ipv4,
            FIELD_IPV6 => Self::Ipv6,
            FIELD_TCP => Self::Tcp,
            FIELD_UDP => Self::Udp,
            FIELD_ICMP => Self::Icmp,
            FIELD_ICMPV6 => Self::Icmpv6,
            FIELD_ARP => Self::Arp,
            FIELD_ND => Self::Nd,
            FIELD_MARK => Self::Mark,
            FIELD_TUNNEL => Self::Tunnel,
            FIELD_MPLS => Self::Mpls,
            _ => Self::Unknown(val),
        }
    }
}

impl From<FieldType> for u16 {
    fn from(ft: FieldType) -> u16 {
        match ft {
            FieldType::Unspec => FIELD_UNSPEC,
            FieldType::Encap => FIELD_ENCAP,
            FieldType::Priority => FIELD_PRIORITY,
            FieldType::InPort => FIELD_IN_PORT,
            FieldType::Ethernet => FIELD_ETHERNET,
            FieldType::Vlan => FIELD_VLAN,
            FieldType::Ethertype => FIELD_ETHERTYPE,
            FieldType::Ipv4 => FIELD_IPV4,
            FieldType::Ipv6 => FIELD_IPV6,
            FieldType::Tcp => FIELD_TCP,
            FieldType::Udp => FIELD_UDP,
            FieldType::Icmp => FIELD_ICMP,
            FieldType::Icmpv6 => FIELD_ICMPV6,
            FieldType::Arp => FIELD_ARP,
            FieldType::Nd => FIELD_ND,
            FieldType::Mark => FIELD_MARK,
            FieldType::Tunnel => FIELD_TUNNEL,
            FieldType::Mpls => FIELD_MPLS,
            FieldType::Unknown(val) => val,
        }
    }
}

pub const SAMPLE_UNSPEC: u16 = 0;
pub const SAMPLE_PROBABILITY: u16 = 1;
pub const SAMPLE_ACTIONS: u16 = 2;

/// Attributes nested inside a `Sample` action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SampleType {
    Unspec,
    Probability,
    Actions,
    Unknown(u16),
}

impl From<u16> for SampleType {
    fn from(val: u16) -> Self {
        match val {
            SAMPLE_UNSPEC => Self::Unspec,
            SAMPLE_PROBABILITY => Self::Probability,
            SAMPLE_ACTIONS => Self::Actions,
            _ => Self::Unknown(val),
        }
    }
}

impl From<SampleType> for u16 {
    fn from(st: SampleType) -> u16 {
        match st {
            SampleType::Unspec => SAMPLE_UNSPEC,
            SampleType::Probability => SAMPLE_PROBABILITY,
            SampleType::Actions => SAMPLE_ACTIONS,
            SampleType::Unknown(val) => val,
        }
    }
}

pub const UPCALL_UNSPEC: u16 = 0;
pub const UPCALL_PID: u16 = 1;
pub const UPCALL_USERDATA: u16 = 2;

/// Attributes nested inside an `Upcall` action.
///
/// The datapath never interprets these; they ride along for the
/// exception-path consumer. Defined here so producers and consumers
/// agree on the numbering.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum UpcallType {
    Unspec,
    Pid,
    Userdata,
    Unknown(u16),
}

impl From<u16> for UpcallType {
    fn from(val: u16) -> Self {
        match val {
            UPCALL_UNSPEC => Self::Unspec,
            UPCALL_PID => Self::Pid,
            UPCALL_USERDATA => Self::Userdata,
            _ => Self::Unknown(val),
        }
    }
}

impl From<UpcallType> for u16 {
    fn from(ut: UpcallType) -> u16 {
        match ut {
            UpcallType::Unspec => UPCALL_UNSPEC,
            UpcallType::Pid => UPCALL_PID,
            UpcallType::Userdata => UPCALL_USERDATA,
            UpcallType::Unknown(val) => val,
        }
    }
}

/// Argument to `PushVlan`: the 802.1Q tag to insert, TPID first, both
/// in network order.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct PushVlanArg {
    pub tpid: [u8; 2],
    pub tci: [u8; 2],
}

impl PushVlanArg {
    pub fn new(tpid: u16, tci: u16) -> Self {
        Self { tpid: tpid.to_be_bytes(), tci: tci.to_be_bytes() }
    }
}

/// Argument to `PushMpls`: the label stack entry to insert and the
/// MPLS ethertype (unicast or multicast) to stamp on the frame.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct PushMplsArg {
    pub lse: [u8; 4],
    pub ethertype: [u8; 2],
}

impl PushMplsArg {
    pub fn new(lse: [u8; 4], ethertype: u16) -> Self {
        Self { lse, ethertype: ethertype.to_be_bytes() }
    }
}

/// `Set(Ethernet)` payload.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct EtherKey {
    pub src: MacAddr,
    pub dst: MacAddr,
}

/// `Set(Ipv4)` payload.
///
/// `proto` and `frag` share the flow-key shape but are not written by
/// the datapath: an IPv4 rewrite covers addresses, TOS, and TTL.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct Ipv4Key {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub proto: u8,
    pub tos: u8,
    pub ttl: u8,
    pub frag: u8,
}

/// `Set(Ipv6)` payload. The flow label rides in the low 20 bits of
/// the big-endian `label` word.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct Ipv6Key {
    pub src: Ipv6Addr,
    pub dst: Ipv6Addr,
    pub label: [u8; 4],
    pub proto: u8,
    pub tclass: u8,
    pub hlimit: u8,
    pub frag: u8,
}

/// `Set(Tcp)` payload: ports in network order.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct TcpKey {
    pub src: [u8; 2],
    pub dst: [u8; 2],
}

impl TcpKey {
    pub fn new(src: u16, dst: u16) -> Self {
        Self { src: src.to_be_bytes(), dst: dst.to_be_bytes() }
    }
}

/// `Set(Udp)` payload: ports in network order.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct UdpKey {
    pub src: [u8; 2],
    pub dst: [u8; 2],
}

impl UdpKey {
    pub fn new(src: u16, dst: u16) -> Self {
        Self { src: src.to_be_bytes(), dst: dst.to_be_bytes() }
    }
}

/// `Set(Mpls)` payload: the replacement outermost label stack entry.
#[derive(
    AsBytes, Clone, Copy, Debug, Eq, FromBytes, FromZeroes, PartialEq,
    Unaligned,
)]
#[repr(C)]
pub struct MplsKey {
    pub lse: [u8; 4],
}
