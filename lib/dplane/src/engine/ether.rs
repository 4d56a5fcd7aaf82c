// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Ethernet frames and 802.1Q tags.

use super::headers::RawHeader;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use dplane_api::EtherKey;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Ref;
use zerocopy::Unaligned;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_VLAN: u16 = 0x8100;
pub const ETHER_TYPE_IPV6: u16 = 0x86DD;
pub const ETHER_TYPE_QINQ: u16 = 0x88A8;

pub const ETHER_ADDR_LEN: usize = 6;

/// Offset of the ethertype field in an untagged frame. Also where a
/// new 802.1Q tag lands.
pub const ETHER_TYPE_OFF: usize = 12;

pub const VLAN_HDR_SZ: usize = 4;

/// The CFI/DEI bit of a TCI. Never put on the wire.
pub const VLAN_CFI: u16 = 0x1000;

#[repr(C)]
#[derive(Clone, Debug, FromBytes, AsBytes, FromZeroes, Unaligned)]
pub struct EtherHdrRaw {
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ether_type: [u8; 2],
}

impl<'a> RawHeader<'a> for EtherHdrRaw {
    #[inline]
    fn new_mut(src: &mut [u8]) -> Result<Ref<&mut [u8], Self>, ReadErr> {
        debug_assert_eq!(src.len(), Self::SIZE);
        let hdr = match Ref::new(src) {
            Some(hdr) => hdr,
            None => return Err(ReadErr::BadLayout),
        };
        Ok(hdr)
    }
}

/// Overwrite the frame's source and destination addresses.
pub fn set_addrs(pkt: &mut Packet, key: &EtherKey) -> ReadResult<()> {
    let mut raw = EtherHdrRaw::new_mut(pkt.slice_mut(0, EtherHdrRaw::SIZE)?)?;
    raw.src = key.src.bytes();
    raw.dst = key.dst.bytes();
    Ok(())
}

/// The outer ethertype, or `None` for a runt frame.
pub fn ether_type(pkt: &Packet) -> Option<u16> {
    let bytes = pkt.bytes();

    if bytes.len() < EtherHdrRaw::SIZE {
        return None;
    }

    Some(u16::from_be_bytes([
        bytes[ETHER_TYPE_OFF],
        bytes[ETHER_TYPE_OFF + 1],
    ]))
}

/// Overwrite the outer ethertype.
pub fn set_ether_type(pkt: &mut Packet, ether_type: u16) -> ReadResult<()> {
    let mut raw = EtherHdrRaw::new_mut(pkt.slice_mut(0, EtherHdrRaw::SIZE)?)?;
    raw.ether_type = ether_type.to_be_bytes();
    Ok(())
}

/// Push an 802.1Q tag directly behind the addresses. The previous
/// ethertype becomes the tag's inner ethertype.
pub fn push_vlan(pkt: &mut Packet, tpid: u16, tci: u16) {
    let mut tag = [0u8; VLAN_HDR_SZ];
    tag[0..2].copy_from_slice(&tpid.to_be_bytes());
    tag[2..4].copy_from_slice(&(tci & !VLAN_CFI).to_be_bytes());
    pkt.insert(ETHER_TYPE_OFF, &tag);

    if let Some(off) = pkt.l3_off() {
        pkt.set_l3_off(Some(off + VLAN_HDR_SZ));
    }
    if let Some(off) = pkt.l4_off() {
        pkt.set_l4_off(Some(off + VLAN_HDR_SZ));
    }
}

/// Pop the outermost 802.1Q tag. A frame too short to carry a tag,
/// or not tagged in the first place, is left alone.
pub fn pop_vlan(pkt: &mut Packet) {
    if pkt.len() < EtherHdrRaw::SIZE + VLAN_HDR_SZ {
        return;
    }

    match ether_type(pkt) {
        Some(ETHER_TYPE_VLAN) | Some(ETHER_TYPE_QINQ) => (),
        _ => return,
    }

    pkt.remove(ETHER_TYPE_OFF, VLAN_HDR_SZ);

    if let Some(off) = pkt.l3_off() {
        pkt.set_l3_off(Some(off - VLAN_HDR_SZ));
    }
    if let Some(off) = pkt.l4_off() {
        pkt.set_l4_off(Some(off - VLAN_HDR_SZ));
    }
}
