// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Type-length-value attribute encoding.
//!
//! A compiled action list is a flat run of attributes. Each starts
//! with a four-byte header, a 16-bit length (which includes the
//! header) followed by a 16-bit type, both native-endian, and then
//! the payload. Attributes start on four-byte boundaries; the bytes
//! between a payload and the next boundary are padding. Nesting is an
//! attribute whose payload is itself a run of attributes.

use alloc::vec::Vec;
use core::mem;
use zerocopy::FromBytes;
use zerocopy::Ref;
use zerocopy::Unaligned;

/// Size of an attribute header.
pub const ATTR_HDR_SZ: usize = 4;

/// Attributes start on boundaries of this many bytes.
pub const ATTR_ALIGN: usize = 4;

/// Round `len` up to the attribute alignment.
pub const fn attr_align(len: usize) -> usize {
    (len + ATTR_ALIGN - 1) & !(ATTR_ALIGN - 1)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrError {
    /// Fewer bytes remain than a header needs.
    TruncatedHeader { remaining: usize },
    /// The length field claims less than the header itself.
    BadHeaderLen { len: u16 },
    /// The declared length runs past the end of the buffer.
    TruncatedPayload { claimed: usize, remaining: usize },
    /// The payload is not the size its attribute type calls for.
    BadPayloadSize { expected: usize, actual: usize },
}

/// A single decoded attribute, borrowing the run it was read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Attr<'a> {
    atype: u16,
    val: &'a [u8],
}

impl<'a> Attr<'a> {
    pub fn attr_type(&self) -> u16 {
        self.atype
    }

    /// The payload, padding excluded.
    pub fn val(&self) -> &'a [u8] {
        self.val
    }

    /// View the payload as a wire struct.
    pub fn as_struct<T>(&self) -> Result<&'a T, AttrError>
    where
        T: FromBytes + Unaligned,
    {
        let hdr = match Ref::<_, T>::new(self.val) {
            Some(hdr) => hdr,
            None => {
                return Err(AttrError::BadPayloadSize {
                    expected: mem::size_of::<T>(),
                    actual: self.val.len(),
                });
            }
        };

        Ok(hdr.into_ref())
    }

    /// Read the payload as a native-endian `u32`.
    pub fn as_u32(&self) -> Result<u32, AttrError> {
        if self.val.len() != 4 {
            return Err(AttrError::BadPayloadSize {
                expected: 4,
                actual: self.val.len(),
            });
        }

        Ok(u32::from_ne_bytes([
            self.val[0],
            self.val[1],
            self.val[2],
            self.val[3],
        ]))
    }

    /// Read the payload as a network-order `u16`.
    pub fn as_be16(&self) -> Result<u16, AttrError> {
        if self.val.len() != 2 {
            return Err(AttrError::BadPayloadSize {
                expected: 2,
                actual: self.val.len(),
            });
        }

        Ok(u16::from_be_bytes([self.val[0], self.val[1]]))
    }

    /// Iterate the attributes nested in the payload.
    pub fn nested(&self) -> AttrReader<'a> {
        AttrReader::new(self.val)
    }
}

/// An iterator over a run of attributes.
///
/// The first malformed header yields an `Err`, after which the
/// iterator fuses.
#[derive(Clone, Debug)]
pub struct AttrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> AttrReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl<'a> Iterator for AttrReader<'a> {
    type Item = Result<Attr<'a>, AttrError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }

        let rem = &self.buf[self.pos..];

        if rem.len() < ATTR_HDR_SZ {
            self.pos = self.buf.len();
            return Some(Err(AttrError::TruncatedHeader {
                remaining: rem.len(),
            }));
        }

        let len = u16::from_ne_bytes([rem[0], rem[1]]) as usize;
        let atype = u16::from_ne_bytes([rem[2], rem[3]]);

        if len < ATTR_HDR_SZ {
            self.pos = self.buf.len();
            return Some(Err(AttrError::BadHeaderLen { len: len as u16 }));
        }

        if len > rem.len() {
            self.pos = self.buf.len();
            return Some(Err(AttrError::TruncatedPayload {
                claimed: len,
                remaining: rem.len(),
            }));
        }

        let val = &rem[ATTR_HDR_SZ..len];

        // The final attribute of a run need not be padded; clamp the
        // stride to the end of the buffer.
        self.pos = usize::min(self.pos + attr_align(len), self.buf.len());

        Some(Ok(Attr { atype, val }))
    }
}

/// Serialize a run of attributes.
///
/// The engine itself only reads; this exists for the producers of
/// action lists and upcall payloads, and for tests.
#[derive(Debug, Default)]
pub struct AttrWriter {
    buf: Vec<u8>,
}

impl AttrWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append an attribute, padding the run out to the attribute
    /// alignment.
    pub fn put(&mut self, atype: u16, val: &[u8]) {
        let len = ATTR_HDR_SZ + val.len();
        assert!(len <= u16::MAX as usize, "attribute payload too long");
        self.buf.extend_from_slice(&(len as u16).to_ne_bytes());
        self.buf.extend_from_slice(&atype.to_ne_bytes());
        self.buf.extend_from_slice(val);
        self.buf.resize(attr_align(self.buf.len()), 0);
    }

    pub fn put_u32(&mut self, atype: u16, val: u32) {
        self.put(atype, &val.to_ne_bytes());
    }

    pub fn put_be16(&mut self, atype: u16, val: u16) {
        self.put(atype, &val.to_be_bytes());
    }

    /// Append an attribute with an empty payload.
    pub fn put_flag(&mut self, atype: u16) {
        self.put(atype, &[]);
    }

    /// Open a nested attribute, returning a token to hand back to
    /// [`Self::end_nested`].
    pub fn start_nested(&mut self, atype: u16) -> usize {
        let start = self.buf.len();
        self.put(atype, &[]);
        start
    }

    /// Close the nested attribute opened at `start`, patching its
    /// length to cover everything appended since.
    pub fn end_nested(&mut self, start: usize) {
        let len = self.buf.len() - start;
        assert!(len <= u16::MAX as usize, "nested attribute too long");
        self.buf[start..start + 2].copy_from_slice(&(len as u16).to_ne_bytes());
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
