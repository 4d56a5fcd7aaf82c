// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! UDP headers.

use super::checksum::Checksum;
use super::checksum::HeaderChecksum;
use super::headers::RawHeader;
use super::packet::Packet;
use super::packet::ReadErr;
use super::packet::ReadResult;
use dplane_api::UdpKey;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;
use zerocopy::Ref;
use zerocopy::Unaligned;

#[repr(C)]
#[derive(Clone, Debug, FromBytes, AsBytes, FromZeroes, Unaligned)]
pub struct UdpHdrRaw {
    pub src_port: [u8; 2],
    pub dst_port: [u8; 2],
    pub length: [u8; 2],
    pub csum: [u8; 2],
}

impl<'a> RawHeader<'a> for UdpHdrRaw {
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

// An all-zeros checksum marks a datagram the sender never summed; a
// computed sum that would land on zero goes out as all-ones instead.
fn remap_zero(bytes: [u8; 2]) -> [u8; 2] {
    if bytes == [0; 2] { [0xFF; 2] } else { bytes }
}

/// Overwrite the ports, patching the checksum in step. A datagram
/// carrying no checksum takes the new ports as-is.
pub fn set_ports(pkt: &mut Packet, key: &UdpKey) -> ReadResult<()> {
    let l4_off = pkt.l4_off().ok_or(ReadErr::MissingLayer)?;
    let mut raw = UdpHdrRaw::new_mut(pkt.slice_mut(l4_off, UdpHdrRaw::SIZE)?)?;

    if raw.csum == [0; 2] {
        raw.src_port = key.src;
        raw.dst_port = key.dst;
        return Ok(());
    }

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

    raw.csum = remap_zero(HeaderChecksum::from(csum).bytes());
    Ok(())
}

/// Patch the checksum for an address change in the pseudo-header.
///
/// A packet without a transport header, or a datagram carrying no
/// checksum, is left alone.
pub fn update_pseudo_csum(
    pkt: &mut Packet,
    old: &[u8],
    new: &[u8],
) -> ReadResult<()> {
    let l4_off = match pkt.l4_off() {
        Some(off) => off,
        None => return Ok(()),
    };

    let mut raw = UdpHdrRaw::new_mut(pkt.slice_mut(l4_off, UdpHdrRaw::SIZE)?)?;

    if raw.csum == [0; 2] {
        return Ok(());
    }

    let mut csum = Checksum::from(HeaderChecksum::wrap(raw.csum));
    csum.sub_bytes(old);
    csum.add_bytes(new);
    raw.csum = remap_zero(HeaderChecksum::from(csum).bytes());
    Ok(())
}
