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

//! The parsed form of a received DNS message, and the parser that
//! builds it.
//!
//! Parsing does not copy names or RDATA: an [`RrsetParse`] records
//! where its owner name and records sit in the message buffer, and
//! every accessor that needs the octets takes that buffer as an
//! argument. RRsets live in an arena owned by the [`MsgParse`] and are
//! referred to by [`RrsetHandle`]s; the arena goes away in bulk with
//! the message.
//!
//! RRs are grouped into RRsets by owner, type, class and section
//! through a fixed-size hash table, so records of one RRset need not be
//! adjacent in the message. The same table serves later lookups by the
//! scrubber.

use std::convert::TryInto;
use std::fmt;

use super::constants::*;
use super::Rcode;
use crate::class::Class;
use crate::lookup3::hashlittle;
use crate::name::{self, CompressedName, Name};
use crate::rr::Type;

/// Set on NSEC RRsets whose type bitmap includes SOA (so the NSEC sits
/// at a zone apex).
pub const RRSET_NSEC_AT_APEX: u32 = 0x1;

/// Set on RRsets obtained from a query with the CD bit.
pub const RRSET_CD: u32 = 0x2;

////////////////////////////////////////////////////////////////////////
// PARSE MODEL                                                        //
////////////////////////////////////////////////////////////////////////

/// A section of a DNS message that holds resource records.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Answer => f.write_str("answer"),
            Self::Authority => f.write_str("authority"),
            Self::Additional => f.write_str("additional"),
        }
    }
}

/// Where an RRset's owner name is found.
#[derive(Clone, Debug)]
pub enum Owner {
    /// A possibly compressed name at this index of the message.
    Packet(usize),

    /// A name held outside the message, such as the query name or the
    /// owner of a CNAME synthesized from a DNAME.
    Owned(Name),
}

impl Owner {
    /// Locates the owner name, given the message buffer.
    pub fn locate<'a>(&'a self, packet: &'a [u8]) -> CompressedName<'a> {
        match self {
            Self::Packet(start) => CompressedName::new(packet, *start),
            Self::Owned(name) => name.as_compressed(),
        }
    }
}

/// The RDATA of one record.
#[derive(Clone, Debug)]
pub enum Rdata {
    /// RDATA in the message buffer. Names inside it may be compressed
    /// with pointers into the rest of the message.
    Packet { start: usize, len: usize },

    /// RDATA owned by the parse model, with no compression.
    Owned(Box<[u8]>),
}

impl Rdata {
    /// Returns the RDATA octets, given the message buffer.
    pub fn octets<'a>(&'a self, packet: &'a [u8]) -> &'a [u8] {
        match self {
            Self::Packet { start, len } => packet.get(*start..*start + *len).unwrap_or_default(),
            Self::Owned(octets) => octets,
        }
    }

    /// Returns the length of the RDATA.
    pub fn len(&self) -> usize {
        match self {
            Self::Packet { len, .. } => *len,
            Self::Owned(octets) => octets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locates a name at `offset` within the RDATA, or returns `None`
    /// if the RDATA is too short to hold one there.
    pub fn name_at<'a>(&'a self, packet: &'a [u8], offset: usize) -> Option<CompressedName<'a>> {
        match self {
            Self::Packet { start, len } if offset < *len => {
                Some(CompressedName::new(packet, start + offset))
            }
            Self::Owned(octets) if offset < octets.len() => {
                Some(CompressedName::new(octets, offset))
            }
            _ => None,
        }
    }
}

/// One record of an RRset: its TTL (as received) and RDATA.
#[derive(Clone, Debug)]
pub struct RrParse {
    pub ttl: u32,
    pub rdata: Rdata,
}

/// A handle to an RRset in a [`MsgParse`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RrsetHandle(usize);

/// An RRset found in a message.
#[derive(Clone, Debug)]
pub struct RrsetParse {
    bucket_next: Option<RrsetHandle>,
    pub hash: u32,
    pub section: Section,
    pub owner: Owner,
    /// The uncompressed length of the owner name.
    pub owner_len: usize,
    pub rr_type: Type,
    pub class: Class,
    pub flags: u32,
    pub rrs: Vec<RrParse>,
    pub rrsigs: Vec<RrParse>,
    /// The sum of the RDATA lengths of `rrs` and `rrsigs`.
    pub size: usize,
    /// Marks additional-section address RRsets found to be glue for
    /// a relevant record during scrubbing.
    pub scrub_ok: bool,
}

impl RrsetParse {
    /// Creates an RRset with no records. The hash is computed here.
    pub fn new(
        packet: &[u8],
        section: Section,
        owner: Owner,
        rr_type: Type,
        class: Class,
        flags: u32,
    ) -> Self {
        let located = owner.locate(packet);
        let hash = hash_rrset(located, rr_type, class, flags);
        let owner_len = located.decompress().len();
        Self {
            bucket_next: None,
            hash,
            section,
            owner,
            owner_len,
            rr_type,
            class,
            flags,
            rrs: Vec::new(),
            rrsigs: Vec::new(),
            size: 0,
            scrub_ok: false,
        }
    }

    /// Locates the owner name, given the message buffer.
    pub fn owner<'a>(&'a self, packet: &'a [u8]) -> CompressedName<'a> {
        self.owner.locate(packet)
    }

    pub fn push_rr(&mut self, rr: RrParse) {
        self.size += rr.rdata.len();
        self.rrs.push(rr);
    }

    pub fn push_rrsig(&mut self, rr: RrParse) {
        self.size += rr.rdata.len();
        self.rrsigs.push(rr);
    }
}

/// The contents of an OPT pseudo-RR ([RFC 6891 § 6.1]).
///
/// [RFC 6891 § 6.1]: https://datatracker.ietf.org/doc/html/rfc6891#section-6.1
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdnsData {
    pub udp_size: u16,
    pub ext_rcode: u8,
    pub version: u8,
    pub bits: u16,
}

impl EdnsData {
    /// Returns whether the DO (DNSSEC OK) bit is set.
    pub fn dnssec_ok(&self) -> bool {
        self.bits & EDNS_DO_MASK != 0
    }
}

/// The question of a parsed message, left in place in the buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QuestionParse {
    pub qname_start: usize,
    pub qname_len: usize,
    pub qtype: Type,
    pub qclass: Class,
}

impl QuestionParse {
    pub fn qname<'a>(&self, packet: &'a [u8]) -> CompressedName<'a> {
        CompressedName::new(packet, self.qname_start)
    }
}

/// A parsed DNS message.
///
/// The RRset counters (`an_rrsets`, `ns_rrsets`, `ar_rrsets` and
/// `rrset_count`) always agree with the ordered RRset list, which
/// [`MsgParse::rrsets`] walks.
#[derive(Clone, Debug)]
pub struct MsgParse {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
    pub an_rrsets: usize,
    pub ns_rrsets: usize,
    pub ar_rrsets: usize,
    pub rrset_count: usize,
    pub question: Option<QuestionParse>,
    pub edns: Option<EdnsData>,
    arena: Vec<RrsetParse>,
    order: Vec<RrsetHandle>,
    buckets: Box<[Option<RrsetHandle>]>,
}

impl MsgParse {
    /// Reads the header of a message into a new `MsgParse` with no
    /// question or RRsets.
    fn from_header(octets: &[u8]) -> Result<Self> {
        if octets.len() < HEADER_SIZE {
            return Err(ParseError::HeaderTooShort);
        }
        Ok(Self {
            id: read_u16(octets, ID_START)?,
            flags: read_u16(octets, FLAGS_START)?,
            qdcount: read_u16(octets, QDCOUNT_START)?,
            ancount: read_u16(octets, ANCOUNT_START)?,
            nscount: read_u16(octets, NSCOUNT_START)?,
            arcount: read_u16(octets, ARCOUNT_START)?,
            an_rrsets: 0,
            ns_rrsets: 0,
            ar_rrsets: 0,
            rrset_count: 0,
            question: None,
            edns: None,
            arena: Vec::new(),
            order: Vec::new(),
            buckets: vec![None; PARSE_TABLE_SIZE].into_boxed_slice(),
        })
    }

    /// Returns the RCODE from the header.
    pub fn rcode(&self) -> Rcode {
        Rcode::from_flags(self.flags)
    }

    /// Returns whether the QR bit is set.
    pub fn is_response(&self) -> bool {
        self.flags & QR_MASK != 0
    }

    /// Returns whether the AA bit is set.
    pub fn is_authoritative(&self) -> bool {
        self.flags & AA_MASK != 0
    }

    /// Returns the handles of the RRsets in message order.
    pub fn handles(&self) -> impl Iterator<Item = RrsetHandle> + '_ {
        self.order.iter().copied()
    }

    /// Returns the RRsets in message order.
    pub fn rrsets(&self) -> impl Iterator<Item = &RrsetParse> + '_ {
        self.order.iter().map(move |handle| &self.arena[handle.0])
    }

    pub fn rrset(&self, handle: RrsetHandle) -> &RrsetParse {
        &self.arena[handle.0]
    }

    pub fn rrset_mut(&mut self, handle: RrsetHandle) -> &mut RrsetParse {
        &mut self.arena[handle.0]
    }

    /// Finds an RRset still in the hash table by owner, type, class,
    /// flags and section.
    pub fn lookup(
        &self,
        packet: &[u8],
        owner: CompressedName,
        rr_type: Type,
        class: Class,
        flags: u32,
        section: Section,
    ) -> Option<RrsetHandle> {
        let hash = hash_rrset(owner, rr_type, class, flags);
        let mut next = self.buckets[bucket_of(hash)];
        while let Some(handle) = next {
            let rrset = &self.arena[handle.0];
            if rrset.hash == hash
                && rrset.rr_type == rr_type
                && rrset.class == class
                && rrset.flags == flags
                && rrset.section == section
                && rrset.owner(packet).compare(&owner).is_eq()
            {
                return Some(handle);
            }
            next = rrset.bucket_next;
        }
        None
    }

    /// Adds a parsed RRset to the end of the message and to the hash
    /// table.
    pub fn push(&mut self, rrset: RrsetParse) -> RrsetHandle {
        let handle = self.adopt(rrset);
        let bucket = bucket_of(self.arena[handle.0].hash);
        self.arena[handle.0].bucket_next = self.buckets[bucket].replace(handle);
        self.order.push(handle);
        handle
    }

    /// Adds a synthesized RRset to the arena and the counters, but not
    /// to the hash table or the ordered list. The caller places it in
    /// the list with [`MsgParse::restore_order`].
    pub fn adopt_synthesized(&mut self, rrset: RrsetParse) -> RrsetHandle {
        self.adopt(rrset)
    }

    fn adopt(&mut self, rrset: RrsetParse) -> RrsetHandle {
        *self.section_count_mut(rrset.section) += 1;
        self.rrset_count += 1;
        self.arena.push(rrset);
        RrsetHandle(self.arena.len() - 1)
    }

    /// Takes the ordered RRset list out of the message so that it can
    /// be rewritten in a single pass. [`MsgParse::restore_order`] puts
    /// the rewritten list back.
    pub fn take_order(&mut self) -> Vec<RrsetHandle> {
        std::mem::take(&mut self.order)
    }

    pub fn restore_order(&mut self, order: Vec<RrsetHandle>) {
        self.order = order;
        debug_assert_eq!(self.order.len(), self.rrset_count);
        debug_assert_eq!(
            self.rrset_count,
            self.an_rrsets + self.ns_rrsets + self.ar_rrsets
        );
    }

    /// Retires an RRset: unlinks it from the hash table and decrements
    /// the counters. The ordered list is left to the caller, which is
    /// expected to be rewriting it (see [`MsgParse::take_order`]).
    pub fn retire(&mut self, handle: RrsetHandle) {
        let (hash, section) = {
            let rrset = &self.arena[handle.0];
            (rrset.hash, rrset.section)
        };
        let count = self.section_count_mut(section);
        assert!(*count > 0, "section counter underflow");
        *count -= 1;
        self.rrset_count -= 1;

        let bucket = bucket_of(hash);
        let after = self.arena[handle.0].bucket_next.take();
        if self.buckets[bucket] == Some(handle) {
            self.buckets[bucket] = after;
            return;
        }
        let mut next = self.buckets[bucket];
        while let Some(current) = next {
            if self.arena[current.0].bucket_next == Some(handle) {
                self.arena[current.0].bucket_next = after;
                return;
            }
            next = self.arena[current.0].bucket_next;
        }
    }

    /// Removes an RRset from the message entirely.
    pub fn remove(&mut self, handle: RrsetHandle) {
        self.retire(handle);
        self.order.retain(|h| *h != handle);
    }

    fn section_count_mut(&mut self, section: Section) -> &mut usize {
        match section {
            Section::Answer => &mut self.an_rrsets,
            Section::Authority => &mut self.ns_rrsets,
            Section::Additional => &mut self.ar_rrsets,
        }
    }
}

fn bucket_of(hash: u32) -> usize {
    hash as usize & (PARSE_TABLE_SIZE - 1)
}

/// Hashes an RRset's identity: owner name, type, class and flags. The
/// RRset cache keys its entries with the same function, so a hash
/// computed at parse time can be reused at insertion.
pub fn hash_rrset(owner: CompressedName, rr_type: Type, class: Class, flags: u32) -> u32 {
    let mut hash = owner.hash(RRSET_HASH_SEED);
    hash = hashlittle(&u16::from(rr_type).to_be_bytes(), hash);
    hash = hashlittle(&u16::from(class).to_be_bytes(), hash);
    hashlittle(&flags.to_be_bytes(), hash)
}

////////////////////////////////////////////////////////////////////////
// PARSER                                                             //
////////////////////////////////////////////////////////////////////////

/// Parses a DNS message. Only the first question is kept. Data after
/// the last record counted in the header is ignored.
pub fn parse_packet(octets: &[u8]) -> Result<MsgParse> {
    let mut msg = MsgParse::from_header(octets)?;
    let mut cursor = HEADER_SIZE;

    for i in 0..msg.qdcount {
        let qname = CompressedName::new(octets, cursor);
        let (qname_len, extent) = qname.measure_with_extent().map_err(ParseError::InvalidName)?;
        let qtype = read_u16(octets, cursor + extent)?.into();
        let qclass = read_u16(octets, cursor + extent + 2)?.into();
        if i == 0 {
            msg.question = Some(QuestionParse {
                qname_start: cursor,
                qname_len,
                qtype,
                qclass,
            });
        }
        cursor += extent + 4;
    }

    let sections = [
        (Section::Answer, msg.ancount),
        (Section::Authority, msg.nscount),
        (Section::Additional, msg.arcount),
    ];
    for (section, count) in sections {
        for _ in 0..count {
            cursor = parse_rr(octets, cursor, section, &mut msg)?;
        }
    }
    Ok(msg)
}

/// Parses the RR at `cursor` into `msg` and returns the index after it.
fn parse_rr(octets: &[u8], cursor: usize, section: Section, msg: &mut MsgParse) -> Result<usize> {
    let owner = CompressedName::new(octets, cursor);
    let (_, extent) = owner.measure_with_extent().map_err(ParseError::InvalidName)?;
    let fixed = cursor + extent;
    let rr_type = Type::from(read_u16(octets, fixed)?);
    let class = Class::from(read_u16(octets, fixed + 2)?);
    let ttl = read_u32(octets, fixed + 4)?;
    let rdlength = read_u16(octets, fixed + 8)? as usize;
    let rdata_start = fixed + 10;
    let rdata_end = rdata_start + rdlength;
    if rdata_end > octets.len() {
        return Err(ParseError::UnexpectedEom);
    }

    if rr_type == Type::OPT {
        if section != Section::Additional {
            return Err(ParseError::MisplacedOpt);
        } else if msg.edns.is_some() {
            return Err(ParseError::DuplicateOpt);
        }
        msg.edns = Some(EdnsData {
            udp_size: class.into(),
            ext_rcode: (ttl >> 24) as u8,
            version: (ttl >> 16) as u8,
            bits: ttl as u16,
        });
        return Ok(rdata_end);
    }

    validate_rdata_names(octets, rr_type, rdata_start, rdata_end)?;
    let rr = RrParse {
        ttl,
        rdata: Rdata::Packet {
            start: rdata_start,
            len: rdlength,
        },
    };

    if rr_type == Type::RRSIG {
        if rdlength < 18 {
            return Err(ParseError::MalformedRrsig);
        }
        let covered = Type::from(read_u16(octets, rdata_start)?);
        let flag_options: &[u32] = if covered == Type::NSEC {
            &[0, RRSET_NSEC_AT_APEX]
        } else {
            &[0]
        };
        for &flags in flag_options {
            if let Some(handle) = msg.lookup(octets, owner, covered, class, flags, section) {
                msg.rrset_mut(handle).push_rrsig(rr);
                return Ok(rdata_end);
            }
        }
    }

    let flags = if rr_type == Type::NSEC && nsec_at_apex(octets, rdata_start, rdata_end) {
        RRSET_NSEC_AT_APEX
    } else {
        0
    };
    let handle = match msg.lookup(octets, owner, rr_type, class, flags, section) {
        Some(handle) => handle,
        None => msg.push(RrsetParse::new(
            octets,
            section,
            Owner::Packet(cursor),
            rr_type,
            class,
            flags,
        )),
    };
    msg.rrset_mut(handle).push_rr(rr);
    Ok(rdata_end)
}

/// Checks the domain names embedded in RDATA of the given type.
fn validate_rdata_names(octets: &[u8], rr_type: Type, start: usize, end: usize) -> Result<()> {
    let invalid = |err| ParseError::InvalidRdataName(rr_type, err);
    let mut offset = start;
    for &gap in rr_type.embedded_names() {
        offset += gap;
        if offset >= end {
            return Err(invalid(name::Error::UnexpectedEom));
        }
        let (_, extent) = CompressedName::new(octets, offset)
            .measure_with_extent()
            .map_err(invalid)?;
        offset += extent;
        if offset > end {
            return Err(invalid(name::Error::UnexpectedEom));
        }
    }
    Ok(())
}

/// Determines whether an NSEC record's type bitmap (window 0) has the
/// SOA bit set.
fn nsec_at_apex(octets: &[u8], start: usize, end: usize) -> bool {
    let next_name = CompressedName::new(octets, start);
    let Ok((_, extent)) = next_name.measure_with_extent() else {
        return false;
    };
    match octets.get(start + extent..end) {
        Some([0, len, first, ..]) => *len > 0 && first & 0x02 != 0,
        _ => false,
    }
}

////////////////////////////////////////////////////////////////////////
// HELPERS FOR READING MULTI-BYTE INTEGERS                            //
////////////////////////////////////////////////////////////////////////

/// Reads a network-byte-order `u16` at index `at` of `octets`.
fn read_u16(octets: &[u8], at: usize) -> Result<u16> {
    let array = octets
        .get(at..at + 2)
        .ok_or(ParseError::UnexpectedEom)?
        .try_into()
        .unwrap();
    Ok(u16::from_be_bytes(array))
}

/// Reads a network-byte-order `u32` at index `at` of `octets`.
fn read_u32(octets: &[u8], at: usize) -> Result<u32> {
    let array = octets
        .get(at..at + 4)
        .ok_or(ParseError::UnexpectedEom)?
        .try_into()
        .unwrap();
    Ok(u32::from_be_bytes(array))
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a message could not be parsed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    HeaderTooShort,
    UnexpectedEom,
    InvalidName(name::Error),
    InvalidRdataName(Type, name::Error),
    MalformedRrsig,
    MisplacedOpt,
    DuplicateOpt,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::UnexpectedEom => f.write_str("unexpected end of message"),
            Self::InvalidName(err) => write!(f, "invalid name: {err}"),
            Self::InvalidRdataName(rr_type, err) => {
                write!(f, "invalid name in {rr_type} RDATA: {err}")
            }
            Self::MalformedRrsig => f.write_str("RRSIG RDATA too short"),
            Self::MisplacedOpt => f.write_str("OPT record outside the additional section"),
            Self::DuplicateOpt => f.write_str("more than one OPT record"),
        }
    }
}

impl std::error::Error for ParseError {}

/// The type returned by the parser.
pub type Result<T> = std::result::Result<T, ParseError>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
