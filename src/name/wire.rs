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

//! Operations on on-the-wire names held in caller-supplied buffers.
//!
//! The functions here work on uncompressed names, such as query names
//! and names that have already been decompressed. None of them panic:
//! apart from [`measure_uncompressed`] and [`validate_all`], which
//! report damage as an [`Error`], they treat a malformed name as if it
//! ended with the null label at the point where the damage begins.
//!
//! Comparisons are ASCII-case-insensitive, per [RFC 4343].
//!
//! [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343

use std::cmp::Ordering;
use std::iter::FusedIterator;

use arrayvec::ArrayVec;

use super::{Error, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};
use crate::lookup3::hashlittle;
use crate::message::constants::POINTER_MAX;

/// The most pointers a label iteration will follow. A longer chain
/// must revisit some target, since there are only this many of them.
const MAX_POINTER_HOPS: usize = POINTER_MAX + 1;

////////////////////////////////////////////////////////////////////////
// MEASUREMENT AND VALIDATION                                         //
////////////////////////////////////////////////////////////////////////

/// Measures the uncompressed name at the start of `octets`, returning
/// its length in octets, including the null label. Compression
/// pointers are not allowed. Data after the name is ignored.
pub fn measure_uncompressed(octets: &[u8]) -> Result<usize, Error> {
    let mut offset = 0;
    loop {
        let label_len = *octets.get(offset).ok_or(Error::UnexpectedEom)?;
        match label_len & 0xc0 {
            0xc0 => return Err(Error::PointerNotAllowed),
            0x40 | 0x80 => return Err(Error::ReservedLabelType),
            _ => (),
        }
        offset += label_len as usize + 1;
        if offset > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        } else if label_len == 0 {
            return Ok(offset);
        } else if offset > octets.len() {
            return Err(Error::UnexpectedEom);
        }
    }
}

/// Like [`measure_uncompressed`], but additionally requires the name to
/// occupy all of `octets`.
pub fn validate_all(octets: &[u8]) -> Result<(), Error> {
    if measure_uncompressed(octets)? < octets.len() {
        Err(Error::ExtraData)
    } else {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// LABEL ITERATION                                                    //
////////////////////////////////////////////////////////////////////////

/// An iterator over the labels of an on-the-wire name, yielding the
/// octets of each label without its length octet.
///
/// The sequence always ends with the null label. If the name is
/// damaged (it runs off the end of the buffer, uses a reserved label
/// type, grows past 255 octets, or, when pointers are followed, takes
/// too many pointer hops), the iterator yields the null label where
/// the damage begins and stops; [`Labels::is_damaged`] then reports
/// `true`.
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    octets: &'a [u8],
    offset: usize,
    follow_pointers: bool,
    hops: usize,
    wire_len: usize,
    done: bool,
    damaged: bool,
}

impl<'a> Labels<'a> {
    /// Iterates over the uncompressed name at the start of `octets`.
    pub fn new(octets: &'a [u8]) -> Self {
        Self::with_options(octets, 0, false)
    }

    /// Iterates over the possibly compressed name at index `start` of
    /// `octets`, following pointers relative to the start of `octets`.
    pub(super) fn compressed(octets: &'a [u8], start: usize) -> Self {
        Self::with_options(octets, start, true)
    }

    fn with_options(octets: &'a [u8], start: usize, follow_pointers: bool) -> Self {
        Self {
            octets,
            offset: start,
            follow_pointers,
            hops: 0,
            wire_len: 0,
            done: false,
            damaged: false,
        }
    }

    /// Returns whether iteration stopped early on a damaged name.
    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    fn stop(&mut self, damaged: bool) -> Option<&'a [u8]> {
        self.done = true;
        self.damaged = damaged;
        Some(&[])
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let label_len = match self.octets.get(self.offset) {
                Some(&len) => len,
                None => return self.stop(true),
            };
            if label_len & 0xc0 == 0xc0 && self.follow_pointers {
                let low = match self.octets.get(self.offset + 1) {
                    Some(&low) => low,
                    None => return self.stop(true),
                };
                let target = ((label_len as usize & 0x3f) << 8) | low as usize;
                self.hops += 1;
                if self.hops > MAX_POINTER_HOPS || target >= self.octets.len() {
                    return self.stop(true);
                }
                self.offset = target;
            } else if label_len as usize > MAX_LABEL_LEN {
                return self.stop(true);
            } else if label_len == 0 {
                return self.stop(false);
            } else {
                // The null label still needs one octet, hence >=.
                self.wire_len += label_len as usize + 1;
                if self.wire_len >= MAX_WIRE_LEN {
                    return self.stop(true);
                }
                let start = self.offset + 1;
                let end = start + label_len as usize;
                return match self.octets.get(start..end) {
                    Some(label) => {
                        self.offset = end;
                        Some(label)
                    }
                    None => self.stop(true),
                };
            }
        }
    }
}

impl FusedIterator for Labels<'_> {}

/// Returns an iterator over the labels of the uncompressed name at the
/// start of `octets`.
pub fn labels(octets: &[u8]) -> Labels {
    Labels::new(octets)
}

/// Returns the number of labels in the name, counting the null label.
pub fn label_count(octets: &[u8]) -> usize {
    labels(octets).count()
}

////////////////////////////////////////////////////////////////////////
// COMPARISON                                                         //
////////////////////////////////////////////////////////////////////////

/// Compares two names label by label from the left. At the first
/// differing position the shorter label sorts first; labels of equal
/// length are compared octet by octet, ignoring ASCII case. This is a
/// total order consistent with case-insensitive equality, but it is
/// *not* the DNSSEC canonical order (see [`canonical_compare`]).
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    compare_labels(labels(a), labels(b))
}

/// The implementation of [`compare`] over any two label sequences, so
/// that compressed names can share it.
pub(super) fn compare_labels<'a>(
    mut a: impl Iterator<Item = &'a [u8]>,
    mut b: impl Iterator<Item = &'a [u8]>,
) -> Ordering {
    loop {
        let label_a = a.next().unwrap_or(&[]);
        let label_b = b.next().unwrap_or(&[]);
        match cmp_label(label_a, label_b) {
            Ordering::Equal if label_a.is_empty() => return Ordering::Equal,
            Ordering::Equal => (),
            unequal => return unequal,
        }
    }
}

/// Compares two names aligned at the root. Returns the ordering given
/// by the difference nearest the root (or, if none, by label count),
/// together with the number of labels that match counting from the
/// root, the null label included.
pub fn label_compare(d1: &[u8], d2: &[u8]) -> (Ordering, usize) {
    root_aligned_compare(d1, d2, cmp_label)
}

/// Compares two names in DNSSEC canonical order ([RFC 4034 § 6.1]):
/// as sequences of labels read from the root, where labels compare as
/// case-folded octet strings and a label that is a prefix of another
/// sorts first.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
pub fn canonical_compare(d1: &[u8], d2: &[u8]) -> Ordering {
    root_aligned_compare(d1, d2, cmp_label_canonical).0
}

fn root_aligned_compare(
    d1: &[u8],
    d2: &[u8],
    cmp: fn(&[u8], &[u8]) -> Ordering,
) -> (Ordering, usize) {
    let labels1: ArrayVec<&[u8], MAX_N_LABELS> = labels(d1).collect();
    let labels2: ArrayVec<&[u8], MAX_N_LABELS> = labels(d2).collect();
    let mut matching = 0;
    for (a, b) in labels1.iter().rev().zip(labels2.iter().rev()) {
        let ordering = cmp(a, b);
        if ordering.is_ne() {
            return (ordering, matching);
        }
        matching += 1;
    }
    (labels1.len().cmp(&labels2.len()), matching)
}

fn cmp_label(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| cmp_label_canonical(a, b))
}

fn cmp_label_canonical(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

/// Returns whether `d1` is equal to or a subdomain of `d2`.
pub fn subdomain(d1: &[u8], d2: &[u8]) -> bool {
    let labels2 = label_count(d2);
    if labels2 > label_count(d1) {
        return false;
    }
    let (ordering, matching) = label_compare(d1, d2);
    ordering.is_ge() && matching == labels2
}

/// Returns whether `d1` is a subdomain of `d2` and not equal to it.
pub fn strict_subdomain(d1: &[u8], d2: &[u8]) -> bool {
    let labels2 = label_count(d2);
    if labels2 >= label_count(d1) {
        return false;
    }
    let (ordering, matching) = label_compare(d1, d2);
    ordering.is_gt() && matching == labels2
}

/// Returns the closest common ancestor of `d1` and `d2`, as a suffix
/// of `d1`.
pub fn shared_topdomain<'a>(d1: &'a [u8], d2: &[u8]) -> &'a [u8] {
    let (_, matching) = label_compare(d1, d2);
    remove_labels(d1, label_count(d1) - matching)
}

////////////////////////////////////////////////////////////////////////
// LABEL MANIPULATION AND INSPECTION                                  //
////////////////////////////////////////////////////////////////////////

/// Strips the first label from the name. The root name is returned
/// unchanged.
pub fn remove_label(octets: &[u8]) -> &[u8] {
    match octets.first() {
        Some(&len) if len != 0 && len as usize <= MAX_LABEL_LEN => {
            octets.get(len as usize + 1..).unwrap_or_default()
        }
        _ => octets,
    }
}

/// Strips the first `n` labels from the name, stopping at the root.
pub fn remove_labels(octets: &[u8], n: usize) -> &[u8] {
    (0..n).fold(octets, |name, _| remove_label(name))
}

/// Returns whether the name is the root name.
pub fn is_root(octets: &[u8]) -> bool {
    octets.first() == Some(&0)
}

/// Returns whether the first label of the name is `*`.
pub fn is_wildcard(octets: &[u8]) -> bool {
    octets.starts_with(b"\x01*")
}

/// Returns the value of the RRSIG labels field ([RFC 4034 § 3.1.3])
/// for an owner name: the label count without the null label and
/// without a leading `*` label.
///
/// [RFC 4034 § 3.1.3]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.1.3
pub fn signature_label_count(octets: &[u8]) -> usize {
    let rest = if is_wildcard(octets) {
        &octets[2..]
    } else {
        octets
    };
    labels(rest).filter(|label| !label.is_empty()).count()
}

/// Makes all ASCII letters in the name lowercase, in place.
pub fn lowercase_in_place(octets: &mut [u8]) {
    let mut offset = 0;
    while let Some(&len) = octets.get(offset) {
        if len == 0 || len as usize > MAX_LABEL_LEN {
            break;
        }
        let end = (offset + 1 + len as usize).min(octets.len());
        octets[offset + 1..end].make_ascii_lowercase();
        offset += 1 + len as usize;
    }
}

////////////////////////////////////////////////////////////////////////
// HASHING                                                            //
////////////////////////////////////////////////////////////////////////

/// Hashes the name, starting from `seed`. Case is folded, so names that
/// compare equal hash equally.
pub fn hash(octets: &[u8], seed: u32) -> u32 {
    hash_labels(labels(octets), seed)
}

/// The implementation of [`hash`] over any label sequence. Each
/// non-null label is fed to lookup3 together with its length octet,
/// chaining the hash value from label to label.
pub(super) fn hash_labels<'a>(labels: impl Iterator<Item = &'a [u8]>, seed: u32) -> u32 {
    let mut hash = seed;
    for label in labels.take_while(|label| !label.is_empty()) {
        let mut buf = ArrayVec::<u8, { MAX_LABEL_LEN + 1 }>::new();
        buf.push(label.len() as u8);
        buf.extend(label.iter().map(u8::to_ascii_lowercase));
        hash = hashlittle(&buf, hash);
    }
    hash
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
