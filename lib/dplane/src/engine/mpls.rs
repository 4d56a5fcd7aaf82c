// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! MPLS label stack entries.
//!
//! An LSE is a single 32-bit big-endian word; there is no checksum to
//! maintain. The stack sits where the network header would otherwise
//! start, so the network offset of an MPLS packet addresses the top
//! of the stack.

use super::ether;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use dplane_api::MplsKey;

pub const ETHER_TYPE_MPLS: u16 = 0x8847;
pub const ETHER_TYPE_MPLS_MCAST: u16 = 0x8848;

pub const MPLS_HDR_SZ: usize = 4;

pub const MPLS_LABEL_MASK: u32 = 0xFFFF_F000;
pub const MPLS_LABEL_SHIFT: u32 = 12;
pub const MPLS_TC_MASK: u32 = 0x0000_0E00;
pub const MPLS_TC_SHIFT: u32 = 9;
pub const MPLS_BOS_MASK: u32 = 0x0000_0100;
pub const MPLS_BOS_SHIFT: u32 = 8;
pub const MPLS_TTL_MASK: u32 = 0x0000_00FF;

pub fn is_mpls_ether_type(ether_type: u16) -> bool {
    ether_type == ETHER_TYPE_MPLS || ether_type == ETHER_TYPE_MPLS_MCAST
}

/// Build an LSE from its parts. The label is truncated to its 20
/// bits and the traffic class to its 3.
pub fn lse(label: u32, tc: u8, bos: bool, ttl: u8) -> [u8; 4] {
    let word = ((label << MPLS_LABEL_SHIFT) & MPLS_LABEL_MASK)
        | (((tc as u32) << MPLS_TC_SHIFT) & MPLS_TC_MASK)
        | ((bos as u32) << MPLS_BOS_SHIFT)
        | (ttl as u32);
    word.to_be_bytes()
}

pub fn lse_label(lse: [u8; 4]) -> u32 {
    (u32::from_be_bytes(lse) & MPLS_LABEL_MASK) >> MPLS_LABEL_SHIFT
}

pub fn lse_tc(lse: [u8; 4]) -> u8 {
    ((u32::from_be_bytes(lse) & MPLS_TC_MASK) >> MPLS_TC_SHIFT) as u8
}

pub fn lse_bos(lse: [u8; 4]) -> bool {
    u32::from_be_bytes(lse) & MPLS_BOS_MASK != 0
}

pub fn lse_ttl(lse: [u8; 4]) -> u8 {
    (u32::from_be_bytes(lse) & MPLS_TTL_MASK) as u8
}

fn packet_is_mpls(pkt: &Packet) -> bool {
    matches!(ether::ether_type(pkt), Some(et) if is_mpls_ether_type(et))
}

/// Push `lse` onto the label stack, rewriting the Ethernet type to
/// `ether_type`. An `ether_type` that isn't one of the two MPLS
/// values leaves the packet untouched.
///
/// The transport offset slides past the new entry; the network
/// offset stays put and now addresses the top of the stack.
pub fn push_lse(
    pkt: &mut Packet,
    ether_type: u16,
    lse: [u8; 4],
) -> ReadResult<()> {
    if !is_mpls_ether_type(ether_type) {
        return Ok(());
    }

    let l3_off = pkt.l3_off().ok_or(ReadErr::MissingLayer)?;
    ether::set_ether_type(pkt, ether_type)?;
    pkt.insert(l3_off, &lse);

    if let Some(l4_off) = pkt.l4_off() {
        pkt.set_l4_off(Some(l4_off + MPLS_HDR_SZ));
    }

    Ok(())
}

/// Pop the top of the label stack, rewriting the Ethernet type to
/// `ether_type`. A packet that isn't MPLS is left untouched.
pub fn pop_lse(pkt: &mut Packet, ether_type: u16) -> ReadResult<()> {
    if !packet_is_mpls(pkt) {
        return Ok(());
    }

    let l3_off = pkt.l3_off().ok_or(ReadErr::MissingLayer)?;
    ether::set_ether_type(pkt, ether_type)?;
    pkt.remove(l3_off, MPLS_HDR_SZ);

    if let Some(l4_off) = pkt.l4_off() {
        pkt.set_l4_off(Some(l4_off - MPLS_HDR_SZ));
    }

    Ok(())
}

/// Overwrite the top of the label stack. A packet that isn't MPLS is
/// left untouched.
pub fn set_lse(pkt: &mut Packet, key: &MplsKey) -> ReadResult<()> {
    if !packet_is_mpls(pkt) {
        return Ok(());
    }

    let l3_off = pkt.l3_off().ok_or(ReadErr::MissingLayer)?;
    pkt.slice_mut(l3_off, MPLS_HDR_SZ)?.copy_from_slice(&key.lse);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::ether::ETHER_TYPE_IPV4;
    use alloc::vec::Vec;

    fn ip4_frame() -> Packet {
        #[rustfmt::skip]
        let mut bytes = vec![
            // dst
            0xA8, 0x40, 0x25, 0x00, 0x00, 0x02,
            // src
            0xA8, 0x40, 0x25, 0x00, 0x00, 0x01,
            // ether type
            0x08, 0x00,
        ];
        bytes.extend_from_slice(&[0x45; 20]);
        bytes.extend_from_slice(&[0x11; 8]);
        Packet::with_offsets(bytes, Some(14), Some(34))
    }

    #[test]
    fn lse_bit_layout() {
        let entry = lse(0x12345, 0b101, true, 64);
        assert_eq!(entry, [0x12, 0x34, 0x5B, 0x40]);
        assert_eq!(lse_label(entry), 0x12345);
        assert_eq!(lse_tc(entry), 0b101);
        assert!(lse_bos(entry));
        assert_eq!(lse_ttl(entry), 64);

        // Overlong label and tc drop their high bits.
        let entry = lse(0xFFF0_0001, 0xFF, false, 1);
        assert_eq!(lse_label(entry), 0x0000_0001);
        assert_eq!(lse_tc(entry), 0b111);
        assert!(!lse_bos(entry));
    }

    #[test]
    fn push_pop_round_trip() {
        let mut pkt = ip4_frame();
        let orig: Vec<u8> = pkt.bytes().to_vec();

        let entry = lse(100, 0, true, 64);
        push_lse(&mut pkt, ETHER_TYPE_MPLS, entry).unwrap();

        assert_eq!(&pkt.bytes()[12..14], &[0x88, 0x47]);
        assert_eq!(&pkt.bytes()[14..18], &entry);
        assert_eq!(pkt.l3_off(), Some(14));
        assert_eq!(pkt.l4_off(), Some(38));
        assert_eq!(pkt.len(), orig.len() + MPLS_HDR_SZ);

        pop_lse(&mut pkt, ETHER_TYPE_IPV4).unwrap();
        assert_eq!(pkt.bytes(), &orig[..]);
        assert_eq!(pkt.l3_off(), Some(14));
        assert_eq!(pkt.l4_off(), Some(34));
    }

    #[test]
    fn stack_grows_downward() {
        let mut pkt = ip4_frame();
        let bottom = lse(100, 0, true, 64);
        let top = lse(200, 0, false, 64);
        push_lse(&mut pkt, ETHER_TYPE_MPLS, bottom).unwrap();
        push_lse(&mut pkt, ETHER_TYPE_MPLS, top).unwrap();

        assert_eq!(&pkt.bytes()[14..18], &top);
        assert_eq!(&pkt.bytes()[18..22], &bottom);
        assert_eq!(pkt.l4_off(), Some(42));
    }

    #[test]
    fn push_non_mpls_type_no_op() {
        let mut pkt = ip4_frame();
        let orig = pkt.bytes().to_vec();
        push_lse(&mut pkt, ETHER_TYPE_IPV4, lse(100, 0, true, 64)).unwrap();
        assert_eq!(pkt.bytes(), &orig[..]);
    }

    #[test]
    fn pop_non_mpls_no_op() {
        let mut pkt = ip4_frame();
        let orig = pkt.bytes().to_vec();
        pop_lse(&mut pkt, ETHER_TYPE_IPV4).unwrap();
        assert_eq!(pkt.bytes(), &orig[..]);
    }

    #[test]
    fn set_rewrites_top_of_stack() {
        let mut pkt = ip4_frame();
        push_lse(&mut pkt, ETHER_TYPE_MPLS, lse(100, 0, true, 64)).unwrap();

        let key = MplsKey { lse: lse(999, 0b010, true, 32) };
        set_lse(&mut pkt, &key).unwrap();
        assert_eq!(&pkt.bytes()[14..18], &key.lse);

        // Popping back off still restores the original frame.
        pop_lse(&mut pkt, ETHER_TYPE_IPV4).unwrap();
        assert_eq!(pkt.bytes(), &ip4_frame().bytes()[..]);
    }

    #[test]
    fn set_non_mpls_no_op() {
        let mut pkt = ip4_frame();
        let orig = pkt.bytes().to_vec();
        set_lse(&mut pkt, &MplsKey { lse: lse(7, 0, true, 1) }).unwrap();
        assert_eq!(pkt.bytes(), &orig[..]);
    }

    #[test]
    fn push_requires_network_offset() {
        let mut pkt = Packet::new(vec![0; 14]);
        let res = push_lse(&mut pkt, ETHER_TYPE_MPLS, lse(1, 0, true, 1));
        assert_eq!(res, Err(ReadErr::MissingLayer));
    }
}
