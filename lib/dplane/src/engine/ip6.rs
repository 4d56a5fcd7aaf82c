// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv6 headers.

use super::headers::RawHeader;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use super::tcp;
use super::udp;
use dplane_api::Ipv6Key;
use dplane_api::Protocol;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Ref;
use zerocopy::Unaligned;

pub const IPV6_VERSION: u8 = 6;

/// The flow label within the first header word.
pub const IPV6_LABEL_MASK: u32 = 0x000F_FFFF;

/// The traffic class within the first header word, between the
/// version nibble and the flow label.
pub const IPV6_TCLASS_MASK: u32 = 0x0FF0_0000;
pub const IPV6_TCLASS_SHIFT: u8 = 20;

#[repr(C)]
#[derive(Clone, Debug, FromBytes, AsBytes, FromZeroes, Unaligned)]
pub struct Ipv6HdrRaw {
    pub vsn_class_flow: [u8; 4],
    pub payload_len: [u8; 2],
    pub next_hdr: u8,
    pub hop_limit: u8,
    pub src: [u8; 16],
    pub dst: [u8; 16],
}

impl<'a> RawHeader<'a> for Ipv6HdrRaw {
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

/// Rewrite the addresses, next header, traffic class, flow label,
/// and hop limit of the network header.
///
/// IPv6 carries no header checksum of its own, but a transport
/// checksum behind it covers the addresses via the pseudo-header and
/// is patched on an address change. The supplied protocol routes
/// that patch.
pub fn set_fields(pkt: &mut Packet, key: &Ipv6Key) -> ReadResult<()> {
    let l3_off = pkt.l3_off().ok_or(ReadErr::MissingLayer)?;

    let (old_src, old_dst) = {
        let raw =
            Ipv6HdrRaw::new_mut(pkt.slice_mut(l3_off, Ipv6HdrRaw::SIZE)?)?;
        (raw.src, raw.dst)
    };

    let proto = Protocol::from(key.proto);
    let new_src = key.src.bytes();
    let new_dst = key.dst.bytes();

    if old_src != new_src {
        ulp_fixup(pkt, proto, &old_src, &new_src)?;
    }
    if old_dst != new_dst {
        ulp_fixup(pkt, proto, &old_dst, &new_dst)?;
    }

    let mut raw =
        Ipv6HdrRaw::new_mut(pkt.slice_mut(l3_off, Ipv6HdrRaw::SIZE)?)?;
    raw.src = new_src;
    raw.dst = new_dst;
    raw.next_hdr = key.proto;
    raw.hop_limit = key.hlimit;

    // Traffic class and flow label are bitfields of the first word;
    // the version nibble is untouched.
    let mut word = u32::from_be_bytes(raw.vsn_class_flow);
    word = (word & !IPV6_TCLASS_MASK)
        | ((key.tclass as u32) << IPV6_TCLASS_SHIFT);
    word = (word & !IPV6_LABEL_MASK)
        | (u32::from_be_bytes(key.label) & IPV6_LABEL_MASK);
    raw.vsn_class_flow = word.to_be_bytes();

    Ok(())
}

fn ulp_fixup(
    pkt: &mut Packet,
    proto: Protocol,
    old: &[u8],
    new: &[u8],
) -> ReadResult<()> {
    match proto {
        Protocol::TCP => tcp::update_pseudo_csum(pkt, old, new),
        Protocol::UDP => udp::update_pseudo_csum(pkt, old, new),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dplane_api::Ipv6Addr;

    fn ip6_frame() -> Packet {
        #[rustfmt::skip]
        let mut bytes = vec![
            // dst
            0xA8, 0x40, 0x25, 0x00, 0x00, 0x64,
            // src
            0xA8, 0x40, 0x25, 0x00, 0x00, 0x63,
            // ethertype
            0x86, 0xDD,
            // version + tclass + flow label
            0x60, 0x01, 0x23, 0x45,
            // payload length
            0x00, 0x08,
            // next header
            0x11,
            // hop limit
            0x40,
        ];
        let src = Ipv6Addr::from([0xFD00, 0, 0, 0, 0, 0, 0, 1]);
        let dst = Ipv6Addr::from([0xFD00, 0, 0, 0, 0, 0, 0, 2]);
        bytes.extend_from_slice(&src.bytes());
        bytes.extend_from_slice(&dst.bytes());
        Packet::with_offsets(bytes, Some(14), None)
    }

    fn key() -> Ipv6Key {
        Ipv6Key {
            src: Ipv6Addr::from([0xFD00, 0, 0, 0, 0, 0, 0, 1]),
            dst: Ipv6Addr::from([0xFD00, 0, 0, 0, 0, 0, 0, 2]),
            label: 0x00012345u32.to_be_bytes(),
            proto: 0x11,
            tclass: 0x00,
            hlimit: 0x40,
            frag: 0,
        }
    }

    #[test]
    fn rewrite_addrs() {
        let mut pkt = ip6_frame();
        let mut key = key();
        key.src = Ipv6Addr::from([0xFD00, 0, 0, 0, 0, 0, 0, 0x63]);
        key.hlimit = 63;
        set_fields(&mut pkt, &key).unwrap();

        assert_eq!(&pkt.bytes()[22..38], &key.src.bytes());
        assert_eq!(&pkt.bytes()[38..54], &key.dst.bytes());
        // hop limit
        assert_eq!(pkt.bytes()[21], 63);
        // first word unchanged
        assert_eq!(&pkt.bytes()[14..18], &[0x60, 0x01, 0x23, 0x45]);
    }

    #[test]
    fn tclass_label_surgery() {
        let mut pkt = ip6_frame();
        let mut key = key();
        key.tclass = 0xAB;
        key.label = 0x00054321u32.to_be_bytes();
        set_fields(&mut pkt, &key).unwrap();

        // Version nibble keeps its 6; class and label are replaced.
        assert_eq!(&pkt.bytes()[14..18], &[0x6A, 0xB5, 0x43, 0x21]);
    }

    #[test]
    fn label_high_bits_masked() {
        let mut pkt = ip6_frame();
        let mut key = key();
        key.label = 0xFFF54321u32.to_be_bytes();
        key.tclass = 0;
        set_fields(&mut pkt, &key).unwrap();

        assert_eq!(&pkt.bytes()[14..18], &[0x60, 0x05, 0x43, 0x21]);
    }

    #[test]
    fn no_network_layer() {
        let mut pkt = Packet::new(vec![0; 54]);
        assert_eq!(set_fields(&mut pkt, &key()), Err(ReadErr::MissingLayer));
    }
}
