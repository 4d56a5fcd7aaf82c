// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

// Let's make our lives easier and pub use a bunch of stuff.
pub use dplane::ExecCtx;
pub use dplane::api::ACTION_OUTPUT;
pub use dplane::api::ACTION_POP_MPLS;
pub use dplane::api::ACTION_POP_VLAN;
pub use dplane::api::ACTION_PUSH_MPLS;
pub use dplane::api::ACTION_PUSH_VLAN;
pub use dplane::api::ACTION_SAMPLE;
pub use dplane::api::ACTION_SET;
pub use dplane::api::ACTION_UPCALL;
pub use dplane::api::EtherKey;
pub use dplane::api::FIELD_ETHERNET;
pub use dplane::api::FIELD_ETHERTYPE;
pub use dplane::api::FIELD_IPV4;
pub use dplane::api::FIELD_MARK;
pub use dplane::api::FIELD_MPLS;
pub use dplane::api::FIELD_TCP;
pub use dplane::api::FIELD_UDP;
pub use dplane::api::Ipv4Addr;
pub use dplane::api::Ipv4Key;
pub use dplane::api::MacAddr;
pub use dplane::api::MplsKey;
pub use dplane::api::PROTO_TCP;
pub use dplane::api::PROTO_UDP;
pub use dplane::api::PushMplsArg;
pub use dplane::api::PushVlanArg;
pub use dplane::api::SAMPLE_ACTIONS;
pub use dplane::api::SAMPLE_PROBABILITY;
pub use dplane::api::TcpKey;
pub use dplane::api::UPCALL_PID;
pub use dplane::api::UPCALL_USERDATA;
pub use dplane::api::UdpKey;
pub use dplane::engine::actions::Datapath;
pub use dplane::engine::actions::execute_actions;
pub use dplane::engine::checksum::Checksum;
pub use dplane::engine::checksum::HeaderChecksum;
pub use dplane::engine::ether::ETHER_TYPE_IPV4;
pub use dplane::engine::ether::ETHER_TYPE_VLAN;
pub use dplane::engine::flow::FlowKey;
pub use dplane::engine::mpls::ETHER_TYPE_MPLS;
pub use dplane::engine::mpls::MPLS_HDR_SZ;
pub use dplane::engine::mpls::lse;
pub use dplane::engine::nlattr::Attr;
pub use dplane::engine::nlattr::AttrReader;
pub use dplane::engine::nlattr::AttrWriter;
pub use dplane::engine::packet::Packet;
pub use dplane::zerocopy::AsBytes;
pub use rand::RngCore;

pub const ETHER_SRC: [u8; 6] = [0xA8, 0x40, 0x25, 0x00, 0x77, 0x01];
pub const ETHER_DST: [u8; 6] = [0xA8, 0x40, 0x25, 0x00, 0x77, 0x02];

pub const BODY: [u8; 7] = *b"onwards";

fn ether_hdr(ether_type: u16) -> Vec<u8> {
    let mut hdr = Vec::new();
    hdr.extend_from_slice(&ETHER_DST);
    hdr.extend_from_slice(&ETHER_SRC);
    hdr.extend_from_slice(&ether_type.to_be_bytes());
    hdr
}

fn ip4_hdr(src: Ipv4Addr, dst: Ipv4Addr, proto: u8, ulp_len: usize) -> Vec<u8> {
    let total_len = (20 + ulp_len) as u16;
    #[rustfmt::skip]
    let mut hdr = vec![
        // version + IHL
        0x45,
        // DSCP + ECN
        0x00,
        // total length
        (total_len >> 8) as u8, total_len as u8,
        // ident
        0x1A, 0x2B,
        // flags (DF) + frag offset
        0x40, 0x00,
        // TTL
        0x40,
        // protocol
        proto,
        // checksum
        0x00, 0x00,
    ];
    hdr.extend_from_slice(&src.bytes());
    hdr.extend_from_slice(&dst.bytes());

    let csum = HeaderChecksum::from(Checksum::compute(&hdr)).bytes();
    hdr[10..12].copy_from_slice(&csum);
    hdr
}

fn pseudo4(src: Ipv4Addr, dst: Ipv4Addr, proto: u8, ulp_len: u16) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&src.bytes());
    p.extend_from_slice(&dst.bytes());
    p.push(0);
    p.push(proto);
    p.extend_from_slice(&ulp_len.to_be_bytes());
    p
}

/// An Ethernet + IPv4 + TCP packet with valid checksums and a small
/// payload, offsets set the way the flow extractor would leave them.
pub fn tcp4_pkt(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    sport: u16,
    dport: u16,
) -> Packet {
    #[rustfmt::skip]
    let mut tcp = vec![
        // source port
        (sport >> 8) as u8, sport as u8,
        // destination port
        (dport >> 8) as u8, dport as u8,
        // sequence
        0x11, 0x11, 0x11, 0x11,
        // ack
        0x00, 0x00, 0x00, 0x00,
        // offset
        0x50,
        // flags (PSH | ACK)
        0x18,
        // window
        0xFF, 0xFF,
        // checksum
        0x00, 0x00,
        // urgent
        0x00, 0x00,
    ];

    let ulp_len = tcp.len() + BODY.len();
    let mut csum =
        Checksum::compute(&pseudo4(src, dst, PROTO_TCP, ulp_len as u16));
    csum.add_bytes(&tcp);
    csum.add_bytes(&BODY);
    let hc = HeaderChecksum::from(csum).bytes();
    tcp[16..18].copy_from_slice(&hc);

    let mut bytes = ether_hdr(ETHER_TYPE_IPV4);
    bytes.extend_from_slice(&ip4_hdr(src, dst, PROTO_TCP, ulp_len));
    bytes.extend_from_slice(&tcp);
    bytes.extend_from_slice(&BODY);
    Packet::with_offsets(bytes, Some(14), Some(34))
}

/// Like [`tcp4_pkt`] but UDP; `csum` false builds the datagram with
/// the all-zeros "no checksum" marker.
pub fn udp4_pkt(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    sport: u16,
    dport: u16,
    csum: bool,
) -> Packet {
    let ulp_len = 8 + BODY.len();
    #[rustfmt::skip]
    let mut udp = vec![
        // source port
        (sport >> 8) as u8, sport as u8,
        // destination port
        (dport >> 8) as u8, dport as u8,
        // length
        (ulp_len >> 8) as u8, ulp_len as u8,
        // checksum
        0x00, 0x00,
    ];

    if csum {
        let mut sum =
            Checksum::compute(&pseudo4(src, dst, PROTO_UDP, ulp_len as u16));
        sum.add_bytes(&udp);
        sum.add_bytes(&BODY);
        let hc = HeaderChecksum::from(sum).bytes();
        udp[6..8].copy_from_slice(&hc);
    }

    let mut bytes = ether_hdr(ETHER_TYPE_IPV4);
    bytes.extend_from_slice(&ip4_hdr(src, dst, PROTO_UDP, ulp_len));
    bytes.extend_from_slice(&udp);
    bytes.extend_from_slice(&BODY);
    Packet::with_offsets(bytes, Some(14), Some(34))
}

/// Recompute the IPv4 header checksum at the packet's network offset.
pub fn ip4_csum_from_scratch(pkt: &Packet) -> [u8; 2] {
    let l3 = pkt.l3_off().unwrap();
    let hdr_len = ((pkt.bytes()[l3] & 0x0F) as usize) * 4;
    let mut hdr = pkt.bytes()[l3..l3 + hdr_len].to_vec();
    hdr[10] = 0;
    hdr[11] = 0;
    HeaderChecksum::from(Checksum::compute(&hdr)).bytes()
}

pub fn stored_ip4_csum(pkt: &Packet) -> [u8; 2] {
    let l3 = pkt.l3_off().unwrap();
    [pkt.bytes()[l3 + 10], pkt.bytes()[l3 + 11]]
}

fn ulp_csum_off(pkt: &Packet) -> usize {
    let l3 = pkt.l3_off().unwrap();
    let l4 = pkt.l4_off().unwrap();
    match pkt.bytes()[l3 + 9] {
        PROTO_TCP => l4 + 16,
        PROTO_UDP => l4 + 6,
        proto => panic!("no checksum field for protocol {}", proto),
    }
}

/// Recompute the transport checksum over the pseudo-header and the
/// whole transport slice, as a receiver would.
pub fn ulp_csum_from_scratch(pkt: &Packet) -> [u8; 2] {
    let l3 = pkt.l3_off().unwrap();
    let l4 = pkt.l4_off().unwrap();
    let bytes = pkt.bytes();

    let src = Ipv4Addr::from([
        bytes[l3 + 12],
        bytes[l3 + 13],
        bytes[l3 + 14],
        bytes[l3 + 15],
    ]);
    let dst = Ipv4Addr::from([
        bytes[l3 + 16],
        bytes[l3 + 17],
        bytes[l3 + 18],
        bytes[l3 + 19],
    ]);
    let proto = bytes[l3 + 9];
    let ulp_len = (pkt.len() - l4) as u16;

    let mut ulp = bytes[l4..].to_vec();
    let rel = ulp_csum_off(pkt) - l4;
    ulp[rel] = 0;
    ulp[rel + 1] = 0;

    let mut csum = Checksum::compute(&pseudo4(src, dst, proto, ulp_len));
    csum.add_bytes(&ulp);
    HeaderChecksum::from(csum).bytes()
}

pub fn stored_ulp_csum(pkt: &Packet) -> [u8; 2] {
    let off = ulp_csum_off(pkt);
    [pkt.bytes()[off], pkt.bytes()[off + 1]]
}

/// What the engine pushed over each edge, in order. Outputs keep a
/// snapshot of the packet as it was at transmit time.
#[derive(Default)]
pub struct Tap {
    pub outputs: Vec<(u32, Vec<u8>)>,
    pub upcalls: Vec<UpcallRecord>,
}

pub struct UpcallRecord {
    pub pkt: Vec<u8>,
    pub key: FlowKey,
    pub attrs: Vec<u8>,
}

impl Tap {
    pub fn ports(&self) -> Vec<u32> {
        self.outputs.iter().map(|(port, _)| *port).collect()
    }
}

impl Datapath for Tap {
    fn output(&mut self, pkt: &Packet, port: u32) {
        self.outputs.push((port, pkt.bytes().to_vec()));
    }

    fn upcall(&mut self, pkt: &Packet, key: &FlowKey, attr: &Attr<'_>) {
        self.upcalls.push(UpcallRecord {
            pkt: pkt.bytes().to_vec(),
            key: *key,
            attrs: attr.val().to_vec(),
        });
    }
}

/// Hands back the same draw forever.
pub struct FixedRng(pub u32);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }

    fn next_u64(&mut self) -> u64 {
        self.0 as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }
}

/// A fixed draw that counts how often it was asked, so a test can pin
/// down exactly how much entropy an action list consumed.
pub struct CountingRng {
    pub value: u32,
    pub draws: Rc<Cell<u32>>,
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.draws.set(self.draws.get() + 1);
        self.value
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }
}

pub fn ctx() -> ExecCtx {
    ctx_with(FixedRng(0))
}

pub fn ctx_with(rng: impl RngCore + 'static) -> ExecCtx {
    ExecCtx { rng: Box::new(rng), sample_depth_limit: None }
}

/// Append a `Set` action carrying a single field attribute.
pub fn set_action(wtr: &mut AttrWriter, field: u16, val: &[u8]) {
    let set = wtr.start_nested(ACTION_SET);
    wtr.put(field, val);
    wtr.end_nested(set);
}

/// Append a `Sample` action wrapping an already-serialized sublist.
pub fn sample_action(
    wtr: &mut AttrWriter,
    probability: u32,
    subactions: &[u8],
) {
    let sample = wtr.start_nested(ACTION_SAMPLE);
    wtr.put_u32(SAMPLE_PROBABILITY, probability);
    wtr.put(SAMPLE_ACTIONS, subactions);
    wtr.end_nested(sample);
}
