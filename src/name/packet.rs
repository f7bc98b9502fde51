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

//! Names embedded in received DNS messages.
//!
//! A [`CompressedName`] is a position in a message buffer where a
//! possibly compressed name ([RFC 1035 § 4.1.4]) begins. Nothing is
//! copied until [`CompressedName::decompress`] or
//! [`CompressedName::to_name`] is called, so comparisons and hashing
//! can run directly against the received octets.
//!
//! [`CompressedName::measure`] is the validating entry point: a message
//! parser calls it once per name, and names that pass are then safe to
//! traverse. The traversal methods still tolerate damage (see
//! [`Labels`]), so they cannot panic or loop even on unchecked input.
//!
//! [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4

use std::cmp::Ordering;

use arrayvec::ArrayVec;
use log::error;

use super::wire::{self, Labels};
use super::{Error, Name, MAX_WIRE_LEN};
use crate::message::constants::POINTER_MAX;

////////////////////////////////////////////////////////////////////////
// POINTER LOOP DETECTION                                             //
////////////////////////////////////////////////////////////////////////

/// A bitmap with one bit for every offset a compression pointer can
/// reach. A pointer whose target is already marked closes a loop.
pub struct LoopCheck {
    visited: [u8; (POINTER_MAX + 1) / 8],
}

impl LoopCheck {
    pub fn new() -> Self {
        Self {
            visited: [0; (POINTER_MAX + 1) / 8],
        }
    }

    /// Marks `target` as visited. Returns `false` if it already was.
    pub fn visit(&mut self, target: usize) -> bool {
        let byte = &mut self.visited[(target & POINTER_MAX) >> 3];
        let bit = 1 << (target & 7);
        let first = *byte & bit == 0;
        *byte |= bit;
        first
    }
}

impl Default for LoopCheck {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// COMPRESSED NAMES                                                   //
////////////////////////////////////////////////////////////////////////

/// A possibly compressed name at index `start` of a message buffer.
/// Pointers are interpreted relative to the start of the buffer.
#[derive(Clone, Copy, Debug)]
pub struct CompressedName<'a> {
    octets: &'a [u8],
    start: usize,
}

impl<'a> CompressedName<'a> {
    pub fn new(octets: &'a [u8], start: usize) -> Self {
        Self { octets, start }
    }

    /// Returns the index of the name in the buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Validates the name and returns its uncompressed length in
    /// octets, including the null label.
    pub fn measure(&self) -> Result<usize, Error> {
        self.measure_with_extent().map(|(len, _)| len)
    }

    /// Like [`CompressedName::measure`], but also returns the number of
    /// contiguous octets the name occupies at `start` (that is, how far
    /// to skip to reach the next field of the message).
    ///
    /// Forward pointers are accepted. Every pointer target is recorded
    /// in a [`LoopCheck`], and revisiting one fails with
    /// [`Error::PointerLoop`].
    pub fn measure_with_extent(&self) -> Result<(usize, usize), Error> {
        let mut loop_check = LoopCheck::new();
        let mut offset = self.start;
        let mut len = 0;
        let mut extent = None;
        loop {
            let label_len = *self.octets.get(offset).ok_or(Error::UnexpectedEom)?;
            match label_len & 0xc0 {
                0xc0 => {
                    let low = *self.octets.get(offset + 1).ok_or(Error::UnexpectedEom)?;
                    let target = ((label_len as usize & 0x3f) << 8) | low as usize;
                    if target >= self.octets.len() {
                        return Err(Error::PointerOutOfBounds);
                    } else if !loop_check.visit(target) {
                        return Err(Error::PointerLoop);
                    }
                    extent.get_or_insert(offset + 2 - self.start);
                    offset = target;
                }
                0x40 | 0x80 => return Err(Error::ReservedLabelType),
                _ => {
                    len += label_len as usize + 1;
                    if len > MAX_WIRE_LEN {
                        return Err(Error::NameTooLong);
                    } else if label_len == 0 {
                        let extent = extent.unwrap_or(offset + 1 - self.start);
                        return Ok((len, extent));
                    }
                    offset += label_len as usize + 1;
                }
            }
        }
    }

    /// Returns an iterator over the labels of the name.
    pub fn labels(&self) -> Labels<'a> {
        Labels::compressed(self.octets, self.start)
    }

    /// Returns the number of labels in the name, counting the null
    /// label.
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Copies the name out of the message, following pointers. A name
    /// found to be damaged during the copy is replaced by the root name
    /// and an error is logged.
    pub fn decompress(&self) -> ArrayVec<u8, MAX_WIRE_LEN> {
        let mut out = ArrayVec::new();
        let mut labels = self.labels();
        for label in &mut labels {
            out.push(label.len() as u8);
            out.extend(label.iter().copied());
        }
        if labels.is_damaged() {
            error!(
                "damaged name at offset {} of message; using the root instead",
                self.start
            );
            out.clear();
            out.push(0);
        }
        out
    }

    /// Decompresses the name into a new [`Name`].
    pub fn to_name(&self) -> Name {
        Name::from_validated(&self.decompress())
    }

    /// Compares this name with another (possibly in a different
    /// buffer) the way [`wire::compare`] does.
    pub fn compare(&self, other: &CompressedName) -> Ordering {
        wire::compare_labels(self.labels(), other.labels())
    }

    /// Returns whether this name equals `name`, ignoring ASCII case.
    pub fn eq_name(&self, name: &Name) -> bool {
        self.compare(&name.as_compressed()).is_eq()
    }

    /// Returns whether this name is equal to or a subdomain of `zone`.
    pub fn eq_or_subdomain_of(&self, zone: &Name) -> bool {
        wire::subdomain(&self.decompress(), zone.wire_repr())
    }

    /// Hashes the name as [`wire::hash`] would hash its decompressed
    /// form.
    pub fn hash(&self, seed: u32) -> u32 {
        wire::hash_labels(self.labels(), seed)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
