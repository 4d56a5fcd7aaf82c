// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The packet as the engine sees it.

use alloc::vec::Vec;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadErr {
    BadLayout,
    MissingLayer,
    NotEnoughBytes,
    OutOfRange,
}

pub type ReadResult<T> = core::result::Result<T, ReadErr>;

/// A packet under execution.
///
/// The engine sees a packet as a single contiguous buffer plus the
/// layer offsets recorded by whoever extracted the flow key. The
/// buffer is owned so that push and pop actions can grow and shrink
/// it in place. An offset of `None` means the packet has no such
/// layer, e.g. a non-IP frame has no `l3_off`.
pub struct Packet {
    data: Vec<u8>,
    l3_off: Option<usize>,
    l4_off: Option<usize>,
}

impl Packet {
    /// Create a packet with no recorded layer offsets.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, l3_off: None, l4_off: None }
    }

    /// Create a packet along with the network and transport offsets
    /// found during flow key extraction.
    pub fn with_offsets(
        data: Vec<u8>,
        l3_off: Option<usize>,
        l4_off: Option<usize>,
    ) -> Self {
        Self { data, l3_off, l4_off }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Offset of the network header, if the packet has one.
    pub fn l3_off(&self) -> Option<usize> {
        self.l3_off
    }

    pub fn set_l3_off(&mut self, off: Option<usize>) {
        self.l3_off = off;
    }

    /// Offset of the transport header, if the packet has one.
    pub fn l4_off(&self) -> Option<usize> {
        self.l4_off
    }

    pub fn set_l4_off(&mut self, off: Option<usize>) {
        self.l4_off = off;
    }

    /// Return `len` mutable bytes starting at `off`.
    pub fn slice_mut(
        &mut self,
        off: usize,
        len: usize,
    ) -> ReadResult<&mut [u8]> {
        if off > self.data.len() {
            return Err(ReadErr::OutOfRange);
        }

        if off + len > self.data.len() {
            return Err(ReadErr::NotEnoughBytes);
        }

        Ok(&mut self.data[off..off + len])
    }

    /// Splice `bytes` into the buffer at `off`, sliding everything
    /// from `off` onwards towards the tail.
    ///
    /// The caller is responsible for fixing up any layer offsets the
    /// edit invalidates.
    pub fn insert(&mut self, off: usize, bytes: &[u8]) {
        if off > self.data.len() {
            panic!("insert at {} beyond packet end {}", off, self.data.len());
        }

        // Vec has no multi-byte insert; a splice over an empty range
        // is exactly that.
        let _ = self.data.splice(off..off, bytes.iter().copied());
    }

    /// Remove the `len` bytes at `off`, sliding everything after
    /// them towards the head.
    pub fn remove(&mut self, off: usize, len: usize) {
        if off + len > self.data.len() {
            panic!(
                "remove of {}..{} beyond packet end {}",
                off,
                off + len,
                self.data.len()
            );
        }

        let _ = self.data.drain(off..off + len);
    }
}
