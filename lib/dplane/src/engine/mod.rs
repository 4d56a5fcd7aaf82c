// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The action execution engine.
//!
//! All code under this namespace is guarded by the `engine` feature flag.
pub mod actions;
pub mod checksum;
pub mod ether;
pub mod flow;
pub mod headers;
pub mod ip4;
pub mod ip6;
pub mod mpls;
pub mod nlattr;
pub mod packet;
pub mod tcp;
pub mod udp;
