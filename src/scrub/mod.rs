// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Scrubbing of responses before they are trusted.
//!
//! A response from an authoritative server may carry records the
//! server has no business supplying, whether by accident or in an
//! attempt to poison the cache. [`scrub_message`] rewrites a parsed
//! response so that what is left answers the query that was asked and
//! lies within the zone the server was asked about. It works in three
//! steps:
//!
//! 1. A structural check rejects messages that are not a response to
//!    our query.
//! 2. Normalization (for NOERROR and NXDOMAIN responses) follows the
//!    CNAME/DNAME chain from the query name through the answer section,
//!    synthesizing a CNAME for each DNAME that lacks one, and removes
//!    answer RRsets that are off the chain or of the wrong type. Address
//!    RRsets in the additional section survive only as glue for a name
//!    in a kept answer or authority RRset.
//! 3. Sanitization removes every RRset owned by a name outside the
//!    zone.
//!
//! Any error means the whole message must be discarded.

use std::fmt;

use log::{debug, log_enabled, Level};

use crate::class::Class;
use crate::message::{
    MsgParse, Owner, QueryInfo, Rcode, Rdata, RrParse, RrsetHandle, RrsetParse, Section,
};
use crate::name::{wire, Name, NameBuilder};
use crate::rr::Type;

////////////////////////////////////////////////////////////////////////
// ENTRY POINT                                                        //
////////////////////////////////////////////////////////////////////////

/// Scrubs `msg`, which was parsed from `packet`, as a response to
/// `query` from a server trusted only for `zone`.
pub fn scrub_message(
    packet: &[u8],
    msg: &mut MsgParse,
    query: &QueryInfo,
    zone: &Name,
) -> Result<(), ScrubError> {
    check_structure(packet, msg, query)?;
    normalize(packet, msg, query)?;
    sanitize(packet, msg, zone);
    Ok(())
}

fn check_structure(packet: &[u8], msg: &MsgParse, query: &QueryInfo) -> Result<(), ScrubError> {
    if msg.qdcount > 1 {
        return Err(ScrubError::TooManyQuestions(msg.qdcount));
    } else if !msg.is_response() {
        return Err(ScrubError::NotAResponse);
    }
    if let Some(question) = msg.question {
        if !question.qname(packet).eq_name(&query.qname)
            || question.qtype != query.qtype
            || question.qclass != query.qclass
        {
            return Err(ScrubError::QuestionMismatch);
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// NORMALIZATION                                                      //
////////////////////////////////////////////////////////////////////////

fn normalize(packet: &[u8], msg: &mut MsgParse, query: &QueryInfo) -> Result<(), ScrubError> {
    if !matches!(msg.rcode(), Rcode::NoError | Rcode::NxDomain) {
        return Ok(());
    }
    let order = msg.take_order();
    let mut kept = Vec::with_capacity(order.len() + 1);
    let mut next = 0;
    let result = normalize_pass(packet, msg, query, &order, &mut kept, &mut next);
    kept.extend_from_slice(&order[next..]);
    msg.restore_order(kept);
    result
}

/// Walks `order` from `*next`, pushing surviving and synthesized RRsets
/// onto `kept`. On return `*next` is the first handle not yet handled.
fn normalize_pass(
    packet: &[u8],
    msg: &mut MsgParse,
    query: &QueryInfo,
    order: &[RrsetHandle],
    kept: &mut Vec<RrsetHandle>,
    next: &mut usize,
) -> Result<(), ScrubError> {
    let mut sname = Owner::Owned(query.qname.clone());

    while let Some(&handle) = order.get(*next) {
        let rrset = msg.rrset(handle);
        if rrset.section != Section::Answer {
            break;
        }

        if rrset.rr_type == Type::DNAME && dname_applies(packet, &sname, rrset) {
            if rrset.rrs.len() != 1 {
                return Err(ScrubError::MultipleDnameRecords(rrset.rrs.len()));
            }
            let alias = synthesize_alias(packet, &sname, rrset)?;
            let class = rrset.class;
            kept.push(handle);
            *next += 1;

            // A CNAME the server sent along is as good as ours, and
            // keeps the server's capitalization.
            if let Some(&following) = order.get(*next) {
                let cname = msg.rrset(following);
                if cname.rr_type == Type::CNAME
                    && owned_by(packet, cname, &sname)
                    && cname_target(packet, cname).map_or(false, |target| {
                        target.locate(packet).eq_name(&alias)
                    })
                {
                    continue;
                }
            }

            let synthesized = synthesize_cname(packet, &sname, &alias, class);
            kept.push(msg.adopt_synthesized(synthesized));
            sname = Owner::Owned(alias);
            continue;
        }

        if !owned_by(packet, rrset, &sname) {
            remove(packet, msg, handle, "normalize: removing irrelevant RRset");
            *next += 1;
            continue;
        }

        if rrset.rr_type == Type::CNAME {
            sname = cname_target(packet, rrset)?;
            kept.push(handle);
            *next += 1;
            continue;
        }

        if query.qtype != Type::ANY && query.qtype != rrset.rr_type {
            remove(packet, msg, handle, "normalize: removing irrelevant RRset");
            *next += 1;
            continue;
        }

        mark_additional(packet, msg, handle);
        kept.push(handle);
        *next += 1;
    }

    while let Some(&handle) = order.get(*next) {
        if msg.rrset(handle).section != Section::Authority {
            break;
        }
        mark_additional(packet, msg, handle);
        kept.push(handle);
        *next += 1;
    }

    while let Some(&handle) = order.get(*next) {
        let rrset = msg.rrset_mut(handle);
        if rrset.section != Section::Additional {
            break;
        }
        *next += 1;
        if rrset.rr_type.is_address() {
            if rrset.scrub_ok {
                rrset.scrub_ok = false;
            } else {
                remove(packet, msg, handle, "normalize: removing irrelevant RRset");
                continue;
            }
        }
        kept.push(handle);
    }

    Ok(())
}

/// Returns whether the RRset is owned by `sname`.
fn owned_by(packet: &[u8], rrset: &RrsetParse, sname: &Owner) -> bool {
    rrset.owner(packet).compare(&sname.locate(packet)).is_eq()
}

/// Returns whether a DNAME RRset's owner is a strict superdomain of
/// `sname`.
fn dname_applies(packet: &[u8], sname: &Owner, dname: &RrsetParse) -> bool {
    wire::strict_subdomain(
        &sname.locate(packet).decompress(),
        &dname.owner(packet).decompress(),
    )
}

/// Locates the target of a CNAME RRset, which must have exactly one
/// record.
fn cname_target(packet: &[u8], cname: &RrsetParse) -> Result<Owner, ScrubError> {
    if cname.rrs.len() != 1 {
        return Err(ScrubError::MultipleCnameRecords(cname.rrs.len()));
    }
    let rdata = &cname.rrs[0].rdata;
    let target = rdata
        .name_at(packet, 0)
        .ok_or(ScrubError::MalformedTarget(Type::CNAME))?;
    target
        .measure()
        .map_err(|_| ScrubError::MalformedTarget(Type::CNAME))?;
    Ok(match rdata {
        Rdata::Packet { start, .. } => Owner::Packet(*start),
        Rdata::Owned(_) => Owner::Owned(target.to_name()),
    })
}

/// Substitutes the DNAME's target for its owner at the end of `sname`.
fn synthesize_alias(packet: &[u8], sname: &Owner, dname: &RrsetParse) -> Result<Name, ScrubError> {
    let target = dname.rrs[0]
        .rdata
        .name_at(packet, 0)
        .ok_or(ScrubError::MalformedTarget(Type::DNAME))?;
    target
        .measure()
        .map_err(|_| ScrubError::MalformedTarget(Type::DNAME))?;

    let sname = sname.locate(packet);
    let prefix = sname.label_count() - dname.owner(packet).label_count();
    let mut builder = NameBuilder::new();
    for label in sname.labels().take(prefix) {
        builder
            .try_push_label(label)
            .map_err(|_| ScrubError::SynthesizedNameTooLong)?;
    }
    builder
        .finish_onto(&target.to_name())
        .map_err(|_| ScrubError::SynthesizedNameTooLong)
}

/// Builds the CNAME `sname` → `alias` that a DNAME implies. Its TTL is
/// zero, so it is never served from the cache on its own.
fn synthesize_cname(packet: &[u8], sname: &Owner, alias: &Name, class: Class) -> RrsetParse {
    let mut cname = RrsetParse::new(packet, Section::Answer, sname.clone(), Type::CNAME, class, 0);
    cname.push_rr(RrParse {
        ttl: 0,
        rdata: Rdata::Owned(alias.wire_repr().into()),
    });
    cname
}

/// Marks address RRsets in the additional section that provide glue
/// for the names in the RRset's records.
fn mark_additional(packet: &[u8], msg: &mut MsgParse, handle: RrsetHandle) {
    let rrset = msg.rrset(handle);
    let offset = match rrset.rr_type.additional_name_offset() {
        Some(offset) => offset,
        None => return,
    };

    let mut glue = Vec::new();
    for rr in &rrset.rrs {
        let name = match rr.rdata.name_at(packet, offset) {
            Some(name) if name.measure().is_ok() => name,
            _ => continue,
        };
        for rr_type in [Type::A, Type::AAAA] {
            if let Some(found) =
                msg.lookup(packet, name, rr_type, rrset.class, 0, Section::Additional)
            {
                glue.push(found);
            }
        }
    }
    for found in glue {
        msg.rrset_mut(found).scrub_ok = true;
    }
}

////////////////////////////////////////////////////////////////////////
// SANITIZATION                                                       //
////////////////////////////////////////////////////////////////////////

/// Removes every RRset whose owner is outside `zone`. A DNAME is kept
/// by the same rule as anything else.
fn sanitize(packet: &[u8], msg: &mut MsgParse, zone: &Name) {
    let order = msg.take_order();
    let mut kept = Vec::with_capacity(order.len());
    for handle in order {
        if msg.rrset(handle).owner(packet).eq_or_subdomain_of(zone) {
            kept.push(handle);
        } else {
            remove(packet, msg, handle, "sanitize: removing potential poison RRset");
        }
    }
    msg.restore_order(kept);
}

fn remove(packet: &[u8], msg: &mut MsgParse, handle: RrsetHandle, reason: &str) {
    if log_enabled!(Level::Debug) {
        let rrset = msg.rrset(handle);
        debug!(
            "{}: {} {} {} ({} section)",
            reason,
            rrset.owner(packet).to_name(),
            rrset.class,
            rrset.rr_type,
            rrset.section
        );
    }
    msg.retire(handle);
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The reasons a response can be rejected by [`scrub_message`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrubError {
    TooManyQuestions(u16),
    NotAResponse,
    QuestionMismatch,
    MultipleDnameRecords(usize),
    SynthesizedNameTooLong,
    MultipleCnameRecords(usize),
    MalformedTarget(Type),
}

impl fmt::Display for ScrubError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TooManyQuestions(n) => write!(f, "message has {n} questions"),
            Self::NotAResponse => f.write_str("message is not a response"),
            Self::QuestionMismatch => f.write_str("question does not match the query"),
            Self::MultipleDnameRecords(n) => write!(f, "DNAME RRset has {n} records"),
            Self::SynthesizedNameTooLong => {
                f.write_str("name synthesized from DNAME is too long")
            }
            Self::MultipleCnameRecords(n) => write!(f, "CNAME RRset has {n} records"),
            Self::MalformedTarget(rr_type) => write!(f, "malformed {rr_type} target"),
        }
    }
}

impl std::error::Error for ScrubError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::parse_packet;
    use crate::message::testing::{mx_rdata, wire, PacketBuilder};

    const NOERROR: u16 = 0x8180;

    const ADDR_1: &[u8] = b"\xc0\x00\x02\x01";
    const ADDR_2: &[u8] = b"\xc0\x00\x02\x02";

    fn query(qname: &str, qtype: Type) -> QueryInfo {
        QueryInfo::new(qname.parse().unwrap(), qtype, Class::IN)
    }

    fn scrub(
        packet: &[u8],
        query: &QueryInfo,
        zone: &str,
    ) -> (MsgParse, Result<(), ScrubError>) {
        let mut msg = parse_packet(packet).unwrap();
        let result = scrub_message(packet, &mut msg, query, &zone.parse().unwrap());
        (msg, result)
    }

    /// Lists the surviving RRsets as (section, owner, type).
    fn contents(packet: &[u8], msg: &MsgParse) -> Vec<(Section, String, Type)> {
        msg.rrsets()
            .map(|rrset| {
                (
                    rrset.section,
                    rrset.owner(packet).to_name().to_string(),
                    rrset.rr_type,
                )
            })
            .collect()
    }

    fn assert_counters_consistent(msg: &MsgParse) {
        assert_eq!(msg.rrset_count, msg.rrsets().count());
        assert_eq!(msg.rrset_count, msg.an_rrsets + msg.ns_rrsets + msg.ar_rrsets);
        for (section, count) in [
            (Section::Answer, msg.an_rrsets),
            (Section::Authority, msg.ns_rrsets),
            (Section::Additional, msg.ar_rrsets),
        ] {
            assert_eq!(msg.rrsets().filter(|r| r.section == section).count(), count);
        }
    }

    #[test]
    fn irrelevant_answer_is_removed() {
        let packet = PacketBuilder::response(NOERROR)
            .question("example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "example.com.", Type::A, 300, ADDR_1)
            .rr(Section::Answer, "attacker.example.", Type::A, 300, ADDR_2)
            .finish();
        let mut msg = parse_packet(&packet).unwrap();
        assert_eq!((msg.an_rrsets, msg.rrset_count), (2, 2));

        scrub_message(
            &packet,
            &mut msg,
            &query("example.com.", Type::A),
            &"example.com.".parse().unwrap(),
        )
        .unwrap();
        assert_eq!((msg.an_rrsets, msg.rrset_count), (1, 1));
        assert_eq!(
            contents(&packet, &msg),
            [(Section::Answer, "example.com.".to_owned(), Type::A)]
        );
        assert_counters_consistent(&msg);
    }

    #[test]
    fn wrong_type_is_removed_unless_any() {
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "example.com.", Type::A, 300, ADDR_1)
            .rr(Section::Answer, "example.com.", Type::TXT, 300, b"\x02hi")
            .finish();
        let (msg, result) = scrub(&packet, &query("example.com.", Type::A), ".");
        result.unwrap();
        assert_eq!(msg.an_rrsets, 1);

        let (msg, result) = scrub(&packet, &query("example.com.", Type::ANY), ".");
        result.unwrap();
        assert_eq!(msg.an_rrsets, 2);
        assert_counters_consistent(&msg);
    }

    #[test]
    fn cname_chain_is_followed() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "web.example.com.", Type::A, 300, ADDR_2)
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("WEB.example.com."))
            .rr(Section::Answer, "web.example.com.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();

        // The A RRset before the CNAME is out of order. It shares its
        // owner, type and class with the later one, so parsing merged
        // them into one RRset in the first position, where it is
        // removed.
        assert_eq!(
            contents(&packet, &msg),
            [(Section::Answer, "www.example.com.".to_owned(), Type::CNAME)]
        );
        assert_counters_consistent(&msg);
    }

    #[test]
    fn cname_then_answer_is_kept() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("WEB.example.com."))
            .rr(Section::Answer, "web.example.com.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();
        assert_eq!(msg.an_rrsets, 2);
    }

    #[test]
    fn dname_without_cname_gets_synthesized_cname() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.net."))
            .rr(Section::Answer, "www.example.net.", Type::A, 300, ADDR_1)
            .rr(Section::Answer, "www.example.com.", Type::A, 300, ADDR_2)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), ".");
        result.unwrap();

        assert_eq!(
            contents(&packet, &msg),
            [
                (Section::Answer, "example.com.".to_owned(), Type::DNAME),
                (Section::Answer, "www.example.com.".to_owned(), Type::CNAME),
                (Section::Answer, "www.example.net.".to_owned(), Type::A),
            ]
        );
        assert_counters_consistent(&msg);

        let cname = msg.rrsets().nth(1).unwrap();
        assert_eq!(cname.rrs.len(), 1);
        assert_eq!(cname.rrs[0].ttl, 0);
        assert_eq!(cname.class, Class::IN);
        assert_eq!(cname.rrs[0].rdata.octets(&packet), wire("www.example.net."));
    }

    #[test]
    fn dname_with_matching_cname_is_kept_as_sent() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.net."))
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("WWW.Example.NET."))
            .rr(Section::Answer, "www.example.net.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), ".");
        result.unwrap();
        assert_eq!(msg.an_rrsets, 3);
        assert!(msg.rrsets().all(|rrset| matches!(rrset.rrs[0].rdata, Rdata::Packet { .. })));
    }

    #[test]
    fn dname_with_mismatched_cname_is_resynthesized() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.net."))
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("evil.example.org."))
            .rr(Section::Answer, "www.example.net.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), ".");
        result.unwrap();

        // Our CNAME goes right after the DNAME; the server's no longer
        // matches the chain and is removed.
        let rrsets: Vec<&RrsetParse> = msg.rrsets().collect();
        assert_eq!(rrsets.len(), 3);
        assert_eq!(rrsets[1].rr_type, Type::CNAME);
        assert!(matches!(rrsets[1].rrs[0].rdata, Rdata::Owned(_)));
        assert_eq!(rrsets[2].rr_type, Type::A);
        assert_counters_consistent(&msg);
    }

    #[test]
    fn dname_not_above_sname_is_irrelevant() {
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.net."))
            .finish();
        let (msg, result) = scrub(&packet, &query("example.com.", Type::A), ".");
        result.unwrap();
        assert_eq!(msg.rrset_count, 0);
    }

    #[test]
    fn dname_with_two_records_is_rejected() {
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.net."))
            .rr(Section::Answer, "example.com.", Type::DNAME, 300, &wire("example.org."))
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), ".");
        assert_eq!(result, Err(ScrubError::MultipleDnameRecords(2)));
        assert_counters_consistent(&msg);
    }

    #[test]
    fn overlong_synthesized_name_is_rejected() {
        let long_label = "x".repeat(63);
        let qname = format!("{0}.{0}.{0}.a.", long_label);
        let target = format!("{}.bb.", "y".repeat(63));
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "a.", Type::DNAME, 300, &wire(&target))
            .finish();
        let (_, result) = scrub(&packet, &query(&qname, Type::A), ".");
        assert_eq!(result, Err(ScrubError::SynthesizedNameTooLong));
    }

    #[test]
    fn cname_with_two_records_is_rejected() {
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("a.example.com."))
            .rr(Section::Answer, "www.example.com.", Type::CNAME, 300, &wire("b.example.com."))
            .finish();
        let (_, result) = scrub(&packet, &query("www.example.com.", Type::A), ".");
        assert_eq!(result, Err(ScrubError::MultipleCnameRecords(2)));
    }

    #[test]
    fn glue_is_kept_and_unrelated_addresses_removed() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Authority, "example.com.", Type::NS, 300, &wire("ns1.example.com."))
            .rr(Section::Additional, "NS1.example.com.", Type::A, 300, ADDR_1)
            .rr(Section::Additional, "ns1.example.com.", Type::AAAA, 300, &[0x20; 16])
            .rr(Section::Additional, "stray.example.com.", Type::A, 300, ADDR_2)
            .rr(Section::Additional, "stray.example.com.", Type::TXT, 300, b"\x02hi")
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();

        assert_eq!(
            contents(&packet, &msg),
            [
                (Section::Authority, "example.com.".to_owned(), Type::NS),
                (Section::Additional, "NS1.example.com.".to_owned(), Type::A),
                (Section::Additional, "ns1.example.com.".to_owned(), Type::AAAA),
                (Section::Additional, "stray.example.com.".to_owned(), Type::TXT),
            ]
        );
        assert!(msg.rrsets().all(|rrset| !rrset.scrub_ok));
        assert_counters_consistent(&msg);
    }

    #[test]
    fn mx_answer_marks_glue() {
        let packet = PacketBuilder::response(NOERROR)
            .question("example.com.", Type::MX, Class::IN)
            .rr(Section::Answer, "example.com.", Type::MX, 300, &mx_rdata(10, "mail.example.com."))
            .rr(Section::Additional, "mail.example.com.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("example.com.", Type::MX), "example.com.");
        result.unwrap();
        assert_eq!((msg.an_rrsets, msg.ar_rrsets), (1, 1));
    }

    #[test]
    fn glue_from_removed_answer_does_not_count() {
        let packet = PacketBuilder::response(NOERROR)
            .rr(Section::Answer, "other.example.com.", Type::NS, 300, &wire("ns.example.com."))
            .rr(Section::Additional, "ns.example.com.", Type::A, 300, ADDR_1)
            .finish();
        let (msg, result) = scrub(&packet, &query("example.com.", Type::NS), "example.com.");
        result.unwrap();
        assert_eq!(msg.rrset_count, 0);
    }

    #[test]
    fn off_zone_authority_is_sanitized() {
        let packet = PacketBuilder::response(NOERROR)
            .question("www.example.com.", Type::A, Class::IN)
            .rr(Section::Authority, "example.com.", Type::NS, 300, &wire("ns.example.com."))
            .rr(Section::Authority, "other.org.", Type::NS, 300, &wire("ns.other.org."))
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();
        assert_eq!(
            contents(&packet, &msg),
            [(Section::Authority, "example.com.".to_owned(), Type::NS)]
        );
        assert_counters_consistent(&msg);
    }

    #[test]
    fn other_rcodes_skip_normalization_but_not_sanitization() {
        let packet = PacketBuilder::response(0x8182)
            .rr(Section::Answer, "unrelated.example.com.", Type::A, 300, ADDR_1)
            .rr(Section::Answer, "other.org.", Type::A, 300, ADDR_2)
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();
        assert_eq!(
            contents(&packet, &msg),
            [(Section::Answer, "unrelated.example.com.".to_owned(), Type::A)]
        );
    }

    #[test]
    fn nxdomain_is_normalized() {
        let packet = PacketBuilder::response(0x8183)
            .rr(Section::Answer, "unrelated.example.com.", Type::A, 300, ADDR_1)
            .rr(Section::Authority, "example.com.", Type::SOA, 300, &soa_rdata())
            .finish();
        let (msg, result) = scrub(&packet, &query("www.example.com.", Type::A), "example.com.");
        result.unwrap();
        assert_eq!((msg.an_rrsets, msg.ns_rrsets), (0, 1));
    }

    fn soa_rdata() -> Vec<u8> {
        let mut rdata = wire("ns.example.com.");
        rdata.extend_from_slice(&wire("admin.example.com."));
        rdata.extend_from_slice(&[0; 20]);
        rdata
    }

    #[test]
    fn structural_problems_are_rejected() {
        let query = query("example.com.", Type::A);

        let two_questions = PacketBuilder::response(NOERROR)
            .question("example.com.", Type::A, Class::IN)
            .question("example.com.", Type::A, Class::IN)
            .finish();
        assert_eq!(
            scrub(&two_questions, &query, ".").1,
            Err(ScrubError::TooManyQuestions(2))
        );

        let not_response = PacketBuilder::response(0x0100).finish();
        assert_eq!(scrub(&not_response, &query, ".").1, Err(ScrubError::NotAResponse));

        for (qname, qtype, qclass) in [
            ("example.org.", Type::A, Class::IN),
            ("example.com.", Type::AAAA, Class::IN),
            ("example.com.", Type::A, Class::CH),
        ] {
            let mismatched = PacketBuilder::response(NOERROR)
                .question(qname, qtype, qclass)
                .finish();
            assert_eq!(
                scrub(&mismatched, &query, ".").1,
                Err(ScrubError::QuestionMismatch)
            );
        }

        let echoed = PacketBuilder::response(NOERROR)
            .question("EXAMPLE.COM.", Type::A, Class::IN)
            .finish();
        assert_eq!(scrub(&echoed, &query, ".").1, Ok(()));
    }
}
