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

//! The RRset cache.
//!
//! Cached RRsets are split into an immutable [`RrsetKey`] and mutable
//! [`RrsetData`], so that the data can be replaced while the key (and
//! with it the RRset's ID) stays put. IDs are handed out in increasing
//! order starting from 1; 0 never identifies an RRset. They are only
//! reused after [`RrsetCache::flush`].

use std::fmt;
use std::mem;

use log::{debug, warn};
use parking_lot::Mutex;

use super::lruhash::{EntryPolicy, Error, LruHash, ReadGuard};
use crate::class::Class;
use crate::message::constants::CD_MASK;
use crate::message::parse::RRSET_CD;
use crate::message::{hash_rrset, MsgParse, Rdata, RrParse, RrsetParse, Section};
use crate::name::{CompressedName, Name};
use crate::rr::{Ttl, Type};

////////////////////////////////////////////////////////////////////////
// KEYS AND DATA                                                      //
////////////////////////////////////////////////////////////////////////

/// The identity of a cached RRset.
#[derive(Clone, Debug)]
pub struct RrsetKey {
    /// Assigned by the cache on insertion.
    pub id: u64,
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    /// [`RRSET_NSEC_AT_APEX`](crate::message::parse::RRSET_NSEC_AT_APEX)
    /// and [`RRSET_CD`].
    pub flags: u32,
}

impl RrsetKey {
    pub fn new(owner: Name, rr_type: Type, class: Class, flags: u32) -> Self {
        Self {
            id: 0,
            owner,
            rr_type,
            class,
            flags,
        }
    }

    /// Hashes the key the same way [`hash_rrset`] hashes an RRset in a
    /// received message.
    pub fn hash(&self) -> u32 {
        hash_rrset(self.owner.as_compressed(), self.rr_type, self.class, self.flags)
    }

    /// Returns whether two keys name the same RRset. The ID is not
    /// compared.
    pub fn same_rrset(&self, other: &Self) -> bool {
        self.rr_type == other.rr_type
            && self.class == other.class
            && self.flags == other.flags
            && self.owner == other.owner
    }
}

impl fmt::Display for RrsetKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.owner, self.class, self.rr_type)
    }
}

/// How much an RRset is trusted, by where it came from. Later variants
/// are more trustworthy.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Trust {
    None,
    AdditionalNoAa,
    AuthorityNoAa,
    AdditionalAa,
    NonAuthoritativeAnswerAa,
    AnswerNoAa,
    Glue,
    AuthorityAa,
    AnswerAa,
    SecureNoGlue,
    PrimaryNoGlue,
    Validated,
    Ultimate,
}

impl Trust {
    /// Returns the trust level of an RRset found in `section` of a
    /// response with (or without) the AA bit.
    pub fn from_section(section: Section, authoritative: bool) -> Self {
        match (section, authoritative) {
            (Section::Answer, true) => Self::AnswerAa,
            (Section::Answer, false) => Self::AnswerNoAa,
            (Section::Authority, true) => Self::AuthorityAa,
            (Section::Authority, false) => Self::AuthorityNoAa,
            (Section::Additional, true) => Self::AdditionalAa,
            (Section::Additional, false) => Self::AdditionalNoAa,
        }
    }
}

/// One cached record: its TTL and uncompressed RDATA.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RrData {
    pub ttl: Ttl,
    pub rdata: Box<[u8]>,
}

/// The records of a cached RRset.
#[derive(Clone, Debug)]
pub struct RrsetData {
    /// The smallest TTL among the records and signatures.
    pub ttl: Ttl,
    pub rrs: Vec<RrData>,
    pub rrsigs: Vec<RrData>,
    pub trust: Trust,
}

impl RrsetData {
    /// Builds RRset data from records, computing the RRset TTL.
    pub fn new(rrs: Vec<RrData>, rrsigs: Vec<RrData>, trust: Trust) -> Self {
        let ttl = rrs
            .iter()
            .chain(&rrsigs)
            .map(|rr| rr.ttl)
            .min()
            .unwrap_or(Ttl::ZERO);
        Self {
            ttl,
            rrs,
            rrsigs,
            trust,
        }
    }

    /// Returns the memory charged for the data.
    pub fn size(&self) -> usize {
        let records: usize = self
            .rrs
            .iter()
            .chain(&self.rrsigs)
            .map(|rr| mem::size_of::<RrData>() + rr.rdata.len())
            .sum();
        mem::size_of::<Self>() + records
    }

    fn same_records(&self, other: &Self) -> bool {
        self.rrs.len() == other.rrs.len()
            && self
                .rrs
                .iter()
                .zip(&other.rrs)
                .all(|(a, b)| a.rdata == b.rdata)
    }
}

/// RRset data as held in the cache, with its absolute expiry time.
#[derive(Clone, Debug)]
pub struct CachedRrset {
    /// The time (in seconds, on the caller's clock) at which the RRset
    /// expires.
    pub expires_at: u64,
    pub data: RrsetData,
}

impl CachedRrset {
    fn new(data: RrsetData, now: u64) -> Self {
        Self {
            expires_at: now + u64::from(u32::from(data.ttl)),
            data,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at < now
    }
}

////////////////////////////////////////////////////////////////////////
// CONVERSION FROM RECEIVED MESSAGES                                  //
////////////////////////////////////////////////////////////////////////

/// Converts the RRsets of a (scrubbed) message into cacheable form.
/// Names are decompressed, TTLs are clamped for caching, and trust is
/// assigned from each RRset's section and the AA bit. If the message
/// has the CD bit set, the keys carry [`RRSET_CD`].
pub fn rrsets_from_message(packet: &[u8], msg: &MsgParse) -> Vec<(RrsetKey, RrsetData)> {
    let cd_flag = if msg.flags & CD_MASK != 0 { RRSET_CD } else { 0 };
    let authoritative = msg.is_authoritative();
    msg.rrsets()
        .map(|rrset| {
            let key = RrsetKey::new(
                rrset.owner(packet).to_name(),
                rrset.rr_type,
                rrset.class,
                rrset.flags | cd_flag,
            );
            let data = RrsetData::new(
                convert_records(packet, rrset, &rrset.rrs),
                convert_records(packet, rrset, &rrset.rrsigs),
                Trust::from_section(rrset.section, authoritative),
            );
            (key, data)
        })
        .collect()
}

fn convert_records(packet: &[u8], rrset: &RrsetParse, rrs: &[RrParse]) -> Vec<RrData> {
    rrs.iter()
        .map(|rr| RrData {
            ttl: Ttl::from(rr.ttl).for_cache(),
            rdata: decompress_rdata(packet, rrset.rr_type, &rr.rdata),
        })
        .collect()
}

/// Copies RDATA out of the message, decompressing the names embedded in
/// it. RRSIG RDATA is copied as is: its signer name is never
/// compressed.
fn decompress_rdata(packet: &[u8], rr_type: Type, rdata: &Rdata) -> Box<[u8]> {
    let (start, end) = match rdata {
        Rdata::Packet { start, len } => (*start, start + len),
        Rdata::Owned(octets) => return octets.clone(),
    };
    let mut out = Vec::with_capacity(end - start);
    let mut pos = start;
    for &gap in rr_type.embedded_names() {
        if pos + gap >= end {
            break;
        }
        out.extend_from_slice(&packet[pos..pos + gap]);
        pos += gap;
        let name = CompressedName::new(packet, pos);
        match name.measure_with_extent() {
            Ok((_, extent)) if pos + extent <= end => {
                out.extend_from_slice(&name.decompress());
                pos += extent;
            }
            _ => break,
        }
    }
    out.extend_from_slice(packet.get(pos..end).unwrap_or_default());
    out.into_boxed_slice()
}

////////////////////////////////////////////////////////////////////////
// THE CACHE                                                          //
////////////////////////////////////////////////////////////////////////

/// The [`EntryPolicy`] of the RRset cache.
#[derive(Debug, Default)]
pub struct RrsetPolicy;

impl EntryPolicy for RrsetPolicy {
    type Key = RrsetKey;
    type Data = CachedRrset;

    fn size(&self, key: &RrsetKey, data: &CachedRrset) -> usize {
        mem::size_of::<RrsetKey>() + key.owner.wire_repr().len() + data.data.size()
    }

    fn key_eq(&self, a: &RrsetKey, b: &RrsetKey) -> bool {
        a.same_rrset(b)
    }
}

/// What [`RrsetCache::update`] did with an RRset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Update {
    /// The RRset was new to the cache and got this ID.
    Inserted(u64),

    /// The RRset replaced the cached data of the RRset with this ID.
    Replaced(u64),

    /// The cached RRset with this ID was kept.
    Kept(u64),
}

impl Update {
    pub fn id(self) -> u64 {
        match self {
            Self::Inserted(id) | Self::Replaced(id) | Self::Kept(id) => id,
        }
    }
}

/// A concurrent cache of RRsets.
pub struct RrsetCache {
    table: LruHash<RrsetPolicy>,
    next_id: Mutex<u64>,
}

impl RrsetCache {
    pub fn new(bins: usize, max_memory: usize) -> Result<Self, Error> {
        Ok(Self {
            table: LruHash::new(bins, max_memory, RrsetPolicy)?,
            next_id: Mutex::new(1),
        })
    }

    /// Offers an RRset to the cache at time `now`. The cached copy is
    /// replaced if the new data is more trusted, if the cached copy has
    /// expired, or if the new data is equally trusted but has different
    /// records. A replaced RRset keeps its ID.
    pub fn update(&self, mut key: RrsetKey, data: RrsetData, now: u64) -> Update {
        let hash = key.hash();
        let existing = self
            .table
            .lookup_read(hash, &key)
            .map(|cached| (cached.key().id, should_replace(&cached, &data, now)));
        let update = match existing {
            Some((id, false)) => return Update::Kept(id),
            Some((id, true)) => {
                key.id = id;
                Update::Replaced(id)
            }
            None => {
                key.id = self.allocate_id();
                Update::Inserted(key.id)
            }
        };
        debug!("caching {} (id {}, trust {:?})", key, key.id, data.trust);
        self.table.insert(hash, key, CachedRrset::new(data, now));
        update
    }

    /// Stores every RRset of a scrubbed message. Returns the number of
    /// RRsets inserted or replaced.
    pub fn store_message(&self, packet: &[u8], msg: &MsgParse, now: u64) -> usize {
        rrsets_from_message(packet, msg)
            .into_iter()
            .map(|(key, data)| self.update(key, data, now))
            .filter(|update| !matches!(update, Update::Kept(_)))
            .count()
    }

    /// Looks up an unexpired RRset.
    pub fn lookup(
        &self,
        owner: &Name,
        rr_type: Type,
        class: Class,
        flags: u32,
        now: u64,
    ) -> Option<ReadGuard<RrsetPolicy>> {
        let key = RrsetKey::new(owner.clone(), rr_type, class, flags);
        self.table
            .lookup_read(key.hash(), &key)
            .filter(|cached| !cached.is_expired(now))
    }

    pub fn remove(&self, key: &RrsetKey) -> bool {
        self.table.remove(key.hash(), key)
    }

    /// Empties the cache and starts IDs over from 1.
    pub fn flush(&self) {
        let mut next_id = self.next_id.lock();
        self.table.clear();
        *next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn space_used(&self) -> usize {
        self.table.space_used()
    }

    pub fn space_max(&self) -> usize {
        self.table.space_max()
    }

    pub fn bin_count(&self) -> usize {
        self.table.bin_count()
    }

    fn allocate_id(&self) -> u64 {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id = match id.checked_add(1) {
            Some(next) => next,
            None => {
                warn!("RRset IDs exhausted; starting over from 1");
                1
            }
        };
        id
    }
}

impl fmt::Debug for RrsetCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RrsetCache")
            .field("table", &self.table)
            .field("next_id", &*self.next_id.lock())
            .finish()
    }
}

fn should_replace(cached: &CachedRrset, new: &RrsetData, now: u64) -> bool {
    new.trust > cached.data.trust
        || cached.is_expired(now)
        || (new.trust == cached.data.trust && !new.same_records(&cached.data))
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
