// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for calculating the internet checksum.
//!
//! The [`Checksum`] type is a rolling one's complement sum. It lets a
//! caller build up (or incrementally patch) a sum across several byte
//! regions before finalizing it into a [`HeaderChecksum`], which holds
//! the bytes as they sit in the header itself.
//!
//! All words are summed as big-endian pairs, the order the bytes have
//! on the wire. A slice of odd length is padded with a zero byte, per
//! RFC 1071. Incremental updates follow RFC 1624: subtract the old
//! bytes from the sum, add the new ones, fold, complement.

/// The checksum value as it is contained in a network header.
///
/// This holds the bytes as they are stored in the header itself,
/// which is to say with one's complement already applied.
pub struct HeaderChecksum {
    inner: [u8; 2],
}

impl HeaderChecksum {
    /// Return the bytes of this header checksum.
    pub fn bytes(&self) -> [u8; 2] {
        self.inner
    }

    /// Wrap the checksum bytes in a header.
    ///
    /// The "wrap" verbiage is meant to make it clear that the pair of
    /// bytes already represents a header checksum -- i.e., the one's
    /// complement of a one's complement sum.
    pub fn wrap(hc: [u8; 2]) -> Self {
        Self { inner: hc }
    }
}

impl From<Checksum> for HeaderChecksum {
    /// Finalize the rolling checksum and put it into header form by
    /// performing one's complement.
    fn from(mut csum: Checksum) -> HeaderChecksum {
        Self { inner: (!csum.finalize()).to_be_bytes() }
    }
}

/// A rolling one's complement checksum.
///
/// Carries accumulate in the upper half of a `u32` and are folded
/// back in only when the finalized sum is needed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum {
    inner: u32,
}

impl Checksum {
    /// Creates a new checksum counter.
    pub fn new() -> Self {
        Self { inner: 0 }
    }

    /// Create a new rolling checksum, starting with the passed in
    /// `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        Self { inner: csum_add(0, bytes) }
    }

    /// Update the sum by adding the contents of `bytes`.
    ///
    /// Useful for incrementally updating an existing checksum where
    /// only a portion of the summed bytes is being rewritten.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.inner = csum_add(self.inner, bytes);
    }

    /// Update the sum by subtracting the contents of `bytes`.
    ///
    /// Useful for incrementally updating an existing checksum where
    /// only a portion of the summed bytes is being rewritten.
    pub fn sub_bytes(&mut self, bytes: &[u8]) {
        self.inner = csum_sub(self.inner, bytes);
    }

    /// Finalize the sum by folding the accumulated carries back in
    /// and returning the resulting value as a `u16`.
    pub fn finalize(&mut self) -> u16 {
        while (self.inner >> 16) != 0 {
            self.inner = (self.inner >> 16) + (self.inner & 0xFFFF);
        }

        (self.inner & 0xFFFF) as u16
    }
}

impl From<HeaderChecksum> for Checksum {
    // Convert a header's checksum bytes back into a rolling checksum.
    fn from(hc: HeaderChecksum) -> Self {
        Self { inner: (!u16::from_be_bytes(hc.bytes())) as u32 }
    }
}

fn csum_add(mut csum: u32, bytes: &[u8]) -> u32 {
    let mut len = bytes.len();
    let mut pos = 0;

    while len > 1 {
        csum += (u16::from_be_bytes([bytes[pos], bytes[pos + 1]])) as u32;
        pos += 2;
        len -= 2;
    }

    // An odd tail is the high byte of a zero-padded final word.
    if len == 1 {
        csum += (bytes[pos] as u32) << 8;
    }

    csum
}

fn csum_sub(mut csum: u32, bytes: &[u8]) -> u32 {
    let mut len = bytes.len();
    let mut pos = 0;

    while len > 1 {
        let sub = (!u16::from_be_bytes([bytes[pos], bytes[pos + 1]])) as u32;
        csum += sub;
        pos += 2;
        len -= 2;
    }

    if len == 1 {
        csum += (!((bytes[pos] as u16) << 8)) as u32;
    }

    csum
}
