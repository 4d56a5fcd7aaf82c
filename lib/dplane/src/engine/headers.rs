// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Header abstractions.

use super::packet::ReadErr;
use core::mem;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::Ref;
use zerocopy::Unaligned;

/// A raw header.
///
/// A raw header is the most basic representation of a given header
/// type: the bytes exactly as they sit in the packet, in network
/// order, with no validation of any field. Only the fixed-size base
/// header is covered; options and extensions are somebody else's
/// problem.
pub trait RawHeader<'a>: AsBytes + FromBytes + Unaligned + Sized {
    const SIZE: usize = mem::size_of::<Self>();

    /// Read a mutable, zerocopy version of the raw header from the
    /// passed in mutable slice.
    fn new_mut(src: &mut [u8]) -> Result<Ref<&mut [u8], Self>, ReadErr>;
}
