// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! TCP headers.

use super::checksum::Checksum;
use super::checksum::HeaderChecksum;
use super::headers::RawHeader;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use dplane_api::TcpKey;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Ref;
use zerocopy::Unaligned;

#[repr(C)]
#[derive(Clone, Debug, FromBytes, AsBytes, FromZeroes, Unaligned)]
pub struct TcpHdrRaw {
    pub src_port: [u8; 2],
    pub dst_port: [u8; 2],
    pub seq: [u8; 4],
    pub ack: [u8; 4],
    pub offset: u8,
    pub flags: u8,
    pub win: [u8; 2],
    pub csum: [u8; 2],
    pub urg: [u8; 2],
}

impl<'a> RawHeader<'a> for TcpHdrRaw {
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

/// Overwrite the ports, patching the checksum in step. A port that
/// already holds its new value costs nothing.
pub fn set_ports(pkt: &mut Packet, key: &TcpKey) -> ReadResult<()> {
    let l4_off = pkt.l4_off().ok_or(ReadErr::MissingLayer)?;
    let mut raw = TcpHdrRaw::new_mut(pkt.slice_mut(l4_off, TcpHdrRaw::SIZE)?)?;

    let mut csum = Checksum::from(HeaderChecksum::wrap(raw.csum));

    if raw.src_port != key.src {
        csum.sub_bytes(&raw.src_port);
        csum.add_bytes(&key.src);
        raw.src_port = key.src;
    }

    if raw.dst_port != key.dst {
        csum.sub_bytes(&raw.dst_port);
        csum.add_bytes(&key.dst);
        raw.dst_port = key.dst;
    }

    raw.csum = HeaderChecksum::from(csum).bytes();
    Ok(())
}

/// Patch the checksum for an address change in the pseudo-header.
///
/// A packet without a transport header has nothing to patch.
pub fn update_pseudo_csum(
    pkt: &mut Packet,
    old: &[u8],
    new: &[u8],
) -> ReadResult<()> {
    let l4_off = match pkt.l4_off() {
        Some(off) => off,
        None => return Ok(()),
    };

    let mut raw = TcpHdrRaw::new_mut(pkt.slice_mut(l4_off, TcpHdrRaw::SIZE)?)?;
    let mut csum = Checksum::from(HeaderChecksum::wrap(raw.csum));
    csum.sub_bytes(old);
    csum.add_bytes(new);
    raw.csum = HeaderChecksum::from(csum).bytes();
    Ok(())
}
