// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv4 headers.

use super::checksum::Checksum;
use super::checksum::HeaderChecksum;
use super::headers::RawHeader;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use super::tcp;
use super::udp;
use dplane_api::Ipv4Key;
use dplane_api::Protocol;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Ref;
use zerocopy::Unaligned;

pub const IPV4_HDR_LEN_MASK: u8 = 0x0F;
pub const IPV4_HDR_VER_MASK: u8 = 0xF0;
pub const IPV4_VERSION: u8 = 4;

/// Note: For now we keep this unaligned to be safe.
#[repr(C)]
#[derive(Clone, Debug, FromBytes, AsBytes, FromZeroes, Unaligned)]
pub struct Ipv4HdrRaw {
    pub ver_hdr_len: u8,
    pub dscp_ecn: u8,
    pub total_len: [u8; 2],
    pub ident: [u8; 2],
    pub frag_and_flags: [u8; 2],
    pub ttl: u8,
    pub proto: u8,
    pub csum: [u8; 2],
    pub src: [u8; 4],
    pub dst: [u8; 4],
}

impl Ipv4HdrRaw {
    pub const CSUM_BEGIN: usize = 10;
    pub const CSUM_END: usize = 12;
}

impl<'a> RawHeader<'a> for Ipv4HdrRaw {
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

/// Rewrite the addresses, TOS, and TTL of the network header.
///
/// The header checksum is recomputed whole rather than patched. A
/// source or destination change also patches any dependent transport
/// checksum, which covers those addresses via the pseudo-header.
pub fn set_fields(pkt: &mut Packet, key: &Ipv4Key) -> ReadResult<()> {
    let l3_off = pkt.l3_off().ok_or(ReadErr::MissingLayer)?;

    let (old_src, old_dst, proto, hdr_len) = {
        let raw =
            Ipv4HdrRaw::new_mut(pkt.slice_mut(l3_off, Ipv4HdrRaw::SIZE)?)?;
        (
            raw.src,
            raw.dst,
            Protocol::from(raw.proto),
            usize::from(raw.ver_hdr_len & IPV4_HDR_LEN_MASK) * 4,
        )
    };

    let new_src = key.src.bytes();
    let new_dst = key.dst.bytes();

    if old_src != new_src {
        ulp_fixup(pkt, proto, &old_src, &new_src)?;
    }
    if old_dst != new_dst {
        ulp_fixup(pkt, proto, &old_dst, &new_dst)?;
    }

    {
        let mut raw =
            Ipv4HdrRaw::new_mut(pkt.slice_mut(l3_off, Ipv4HdrRaw::SIZE)?)?;
        raw.src = new_src;
        raw.dst = new_dst;
        raw.dscp_ecn = key.tos;
        raw.ttl = key.ttl;
    }

    // Options are covered too; sum over the full IHL.
    let hdr = pkt.slice_mut(l3_off, hdr_len)?;
    hdr[Ipv4HdrRaw::CSUM_BEGIN..Ipv4HdrRaw::CSUM_END]
        .copy_from_slice(&[0; 2]);
    let csum = HeaderChecksum::from(Checksum::compute(hdr)).bytes();
    hdr[Ipv4HdrRaw::CSUM_BEGIN..Ipv4HdrRaw::CSUM_END].copy_from_slice(&csum);

    Ok(())
}

// The transport checksum folds in the pseudo-header, keyed off the
// protocol the header itself names.
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
