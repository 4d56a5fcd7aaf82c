// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Execution of compiled action lists.
//!
//! An action list arrives as a flat attribute run, already vetted by
//! the flow compiler that produced it. Execution walks the run in
//! order, rewriting the packet in place and handing it to the
//! embedder at the two exits: transmit on a port, or up the
//! exception path.

use super::ether;
use super::flow::FlowKey;
use super::ip4;
use super::ip6;
use super::mpls;
use super::nlattr::Attr;
use super::nlattr::AttrReader;
use super::packet::Packet;
use super::tcp;
use super::udp;
use crate::ExecCtx;
use core::fmt::Debug;
use dplane_api::ActionType;
use dplane_api::EtherKey;
use dplane_api::FieldType;
use dplane_api::Ipv4Key;
use dplane_api::Ipv6Key;
use dplane_api::MplsKey;
use dplane_api::PushMplsArg;
use dplane_api::PushVlanArg;
use dplane_api::SampleType;
use dplane_api::TcpKey;
use dplane_api::UdpKey;

/// The edges where execution leaves the engine.
///
/// `output` transmits the packet in its current state on a port;
/// execution then continues with the rest of the list, so a list may
/// rewrite and output the same packet several times over. `upcall`
/// hands the packet, its flow key, and the raw upcall attribute to
/// the exception path; the engine itself never looks inside that
/// attribute.
pub trait Datapath {
    fn output(&mut self, pkt: &Packet, port: u32);
    fn upcall(&mut self, pkt: &Packet, key: &FlowKey, attr: &Attr<'_>);
}

// A compiled list comes from our own flow compiler. A malformed
// attribute here is a bug in that compiler, not input to limp past
// with a half-rewritten packet.
fn valid<T, E: Debug>(res: Result<T, E>) -> T {
    match res {
        Ok(val) => val,
        Err(e) => panic!("malformed action attribute: {e:?}"),
    }
}

fn action_exec_probe(atype: u16) {
    cfg_if! {
        if #[cfg(feature = "usdt")] {
            crate::dplane_provider::action__exec!(|| atype);
        } else {
            let _ = atype;
        }
    }
}

fn sample_pass_probe(threshold: u32, draw: u32) {
    cfg_if! {
        if #[cfg(feature = "usdt")] {
            crate::dplane_provider::sample__pass!(|| (threshold, draw));
        } else {
            let (_, _) = (threshold, draw);
        }
    }
}

fn sample_skip_probe(threshold: u32, draw: u32) {
    cfg_if! {
        if #[cfg(feature = "usdt")] {
            crate::dplane_provider::sample__skip!(|| (threshold, draw));
        } else {
            let (_, _) = (threshold, draw);
        }
    }
}

/// Execute a compiled action list against `pkt`.
pub fn execute_actions(
    ctx: &mut ExecCtx,
    dp: &mut dyn Datapath,
    pkt: &mut Packet,
    key: &FlowKey,
    actions: &[u8],
) {
    execute_list(ctx, dp, pkt, key, actions, 0);
}

fn execute_list(
    ctx: &mut ExecCtx,
    dp: &mut dyn Datapath,
    pkt: &mut Packet,
    key: &FlowKey,
    actions: &[u8],
    depth: usize,
) {
    for attr in AttrReader::new(actions) {
        let attr = valid(attr);
        let atype = attr.attr_type();
        action_exec_probe(atype);

        match ActionType::from(atype) {
            ActionType::Output => {
                let port = valid(attr.as_u32());
                dp.output(pkt, port);
            }

            ActionType::Upcall => dp.upcall(pkt, key, &attr),

            ActionType::Set => execute_set(pkt, &attr),

            ActionType::PushVlan => {
                let arg: &PushVlanArg = valid(attr.as_struct());
                ether::push_vlan(
                    pkt,
                    u16::from_be_bytes(arg.tpid),
                    u16::from_be_bytes(arg.tci),
                );
            }

            ActionType::PopVlan => ether::pop_vlan(pkt),

            ActionType::PushMpls => {
                let arg: &PushMplsArg = valid(attr.as_struct());
                valid(mpls::push_lse(
                    pkt,
                    u16::from_be_bytes(arg.ethertype),
                    arg.lse,
                ));
            }

            ActionType::PopMpls => {
                let ether_type = valid(attr.as_be16());
                valid(mpls::pop_lse(pkt, ether_type));
            }

            ActionType::Sample => {
                execute_sample(ctx, dp, pkt, key, &attr, depth);
            }

            at @ (ActionType::Unspec | ActionType::Unknown(_)) => {
                panic!("unexpected action type: {}", u16::from(at));
            }
        }
    }
}

// A `Set` wraps exactly one field attribute naming the group to
// rewrite. Groups that only exist for matching can never show up
// here; the compiler refuses them long before a list reaches us.
fn execute_set(pkt: &mut Packet, attr: &Attr<'_>) {
    let field = match attr.nested().next() {
        Some(field) => valid(field),
        None => panic!("set action with no field attribute"),
    };

    match FieldType::from(field.attr_type()) {
        // Host-local metadata; nothing on the wire changes.
        FieldType::Priority | FieldType::Mark | FieldType::Tunnel => (),

        FieldType::Ethernet => {
            let key: &EtherKey = valid(field.as_struct());
            valid(ether::set_addrs(pkt, key));
        }

        FieldType::Ipv4 => {
            let key: &Ipv4Key = valid(field.as_struct());
            valid(ip4::set_fields(pkt, key));
        }

        FieldType::Ipv6 => {
            let key: &Ipv6Key = valid(field.as_struct());
            valid(ip6::set_fields(pkt, key));
        }

        FieldType::Tcp => {
            let key: &TcpKey = valid(field.as_struct());
            valid(tcp::set_ports(pkt, key));
        }

        FieldType::Udp => {
            let key: &UdpKey = valid(field.as_struct());
            valid(udp::set_ports(pkt, key));
        }

        FieldType::Mpls => {
            let key: &MplsKey = valid(field.as_struct());
            valid(mpls::set_lse(pkt, key));
        }

        ft @ (FieldType::Unspec
        | FieldType::Encap
        | FieldType::InPort
        | FieldType::Vlan
        | FieldType::Ethertype
        | FieldType::Icmp
        | FieldType::Icmpv6
        | FieldType::Arp
        | FieldType::Nd
        | FieldType::Unknown(_)) => {
            panic!(
                "field group {} is match-only, cannot be set",
                u16::from(ft)
            );
        }
    }
}

// A failed probability draw abandons the whole sample, including any
// attributes after the probability; a passed draw costs exactly one
// read of the generator.
fn execute_sample(
    ctx: &mut ExecCtx,
    dp: &mut dyn Datapath,
    pkt: &mut Packet,
    key: &FlowKey,
    attr: &Attr<'_>,
    depth: usize,
) {
    let mut subactions = None;

    for nested in attr.nested() {
        let nested = valid(nested);

        match SampleType::from(nested.attr_type()) {
            SampleType::Probability => {
                let threshold = valid(nested.as_u32());
                let draw = ctx.rng.next_u32();

                if draw >= threshold {
                    sample_skip_probe(threshold, draw);
                    return;
                }

                sample_pass_probe(threshold, draw);
            }

            SampleType::Actions => subactions = Some(nested),

            st @ (SampleType::Unspec | SampleType::Unknown(_)) => {
                panic!("unexpected sample attribute: {}", u16::from(st));
            }
        }
    }

    let subactions = match subactions {
        Some(sub) => sub,
        None => panic!("sample action without a nested action list"),
    };

    let depth = depth + 1;

    if let Some(limit) = ctx.sample_depth_limit {
        if depth > limit.get() {
            panic!("sample recursion exceeds depth limit {}", limit);
        }
    }

    execute_list(ctx, dp, pkt, key, subactions.val(), depth);
}
