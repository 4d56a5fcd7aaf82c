// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

pub mod action;
pub mod ip;
pub mod mac;

pub use action::*;
pub use ip::*;
pub use mac::*;

/// The overall version of the wire contract between the flow compiler
/// and the datapath: attribute numbering, payload shapes, and the
/// semantics attached to them. Anytime any of those change, this
/// number must increment. We attach no meaning to the number other
/// than as a means to verify that both sides were compiled against
/// the same contract.
pub const API_VERSION: u64 = 3;
