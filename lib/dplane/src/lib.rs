// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]
// Enable features needed for USDT, if needed.
#![cfg_attr(all(feature = "usdt", not(usdt_stable_asm)), feature(asm))]
#![cfg_attr(
    all(feature = "usdt", target_os = "macos", not(usdt_stable_asm_sym)),
    feature(asm_sym)
)]

extern crate alloc;

#[cfg(feature = "engine")]
#[macro_use]
extern crate cfg_if;

#[cfg(any(feature = "api", test))]
pub mod api;
#[cfg(any(feature = "engine", test))]
pub mod engine;

#[cfg(feature = "engine")]
pub use zerocopy;

#[cfg(any(feature = "engine", test))]
use alloc::boxed::Box;
#[cfg(any(feature = "engine", test))]
use core::num::NonZeroUsize;
#[cfg(any(feature = "engine", test))]
use rand::RngCore;

/// Everything the engine borrows from its embedder while executing a
/// compiled action list.
///
/// The entropy source is handed in rather than conjured up so that
/// kernel and userspace embeddings can supply whatever generator they
/// have, and so tests can supply a deterministic one.
#[cfg(any(feature = "engine", test))]
pub struct ExecCtx {
    pub rng: Box<dyn RngCore>,

    /// An upper bound on nested sample recursion. `None` leaves the
    /// depth unchecked, trusting the action compiler's own limit.
    pub sample_depth_limit: Option<NonZeroUsize>,
}

// ================================================================
// DTrace USDT Provider
//
// Allowing us to use USDT to trace the dplane SDT probes when
// running in std/test.
// ================================================================
#[cfg(feature = "usdt")]
#[usdt::provider]
mod dplane_provider {
    fn action__exec(atype: u16) {}
    fn sample__pass(threshold: u32, draw: u32) {}
    fn sample__skip(threshold: u32, draw: u32) {}
}
