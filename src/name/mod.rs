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

//! Implementation of data structures related to domain names.
//!
//! Three representations are used:
//!
//! * [`Name`], an owned, validated, uncompressed name;
//! * raw uncompressed names in `&[u8]` buffers, handled by the
//!   functions of the [`wire`] module; and
//! * names embedded (possibly compressed) in received messages,
//!   handled through [`packet::CompressedName`].
//!
//! All comparisons and hashes are ASCII-case-insensitive.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

mod builder;
mod error;
pub mod packet;
pub mod wire;
pub use builder::NameBuilder;
pub use error::Error;
pub use packet::CompressedName;

/// The maximum number of labels in a domain name.
pub const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
pub const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
pub const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// An owned domain name in uncompressed on-the-wire form
/// ([RFC 1035 § 3.1]).
///
/// `Name`s can be constructed
///
/// * through the [`FromStr`] implementation;
/// * through a [`NameBuilder`];
/// * from uncompressed on-the-wire names through
///   [`Name::try_from_uncompressed`] and
///   [`Name::try_from_uncompressed_all`]; and
/// * from compressed names in messages through
///   [`Name::try_from_compressed`] and [`CompressedName::to_name`].
///
/// Every constructor validates, so a `Name` always holds at least the
/// null label and at most 255 octets.
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
#[derive(Clone)]
pub struct Name {
    octets: Box<[u8]>,
}

impl Name {
    /// Wraps octets already known to hold exactly one valid name.
    fn from_validated(octets: &[u8]) -> Self {
        debug_assert!(wire::validate_all(octets).is_ok());
        Self {
            octets: octets.into(),
        }
    }

    /// Returns the DNS root, `.`.
    pub fn root() -> Self {
        Self::from_validated(&[0])
    }

    /// Tries to parse an uncompressed name at the start of `octets`.
    /// Data after the name is ignored. Returns the name and its length.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        let len = wire::measure_uncompressed(octets)?;
        Ok((Self::from_validated(&octets[..len]), len))
    }

    /// Like [`Name::try_from_uncompressed`], but fails if there is data
    /// after the name.
    pub fn try_from_uncompressed_all(octets: &[u8]) -> Result<Self, Error> {
        wire::validate_all(octets)?;
        Ok(Self::from_validated(octets))
    }

    /// Tries to parse a possibly compressed name at index `start` of
    /// `octets`, following pointers relative to the start of `octets`.
    /// On success, returns the name and the number of contiguous octets
    /// it occupies at `start`.
    pub fn try_from_compressed(octets: &[u8], start: usize) -> Result<(Self, usize), Error> {
        let compressed = CompressedName::new(octets, start);
        let (_, extent) = compressed.measure_with_extent()?;
        Ok((compressed.to_name(), extent))
    }

    /// Returns the uncompressed on-the-wire representation.
    pub fn wire_repr(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the `Name` as a [`CompressedName`] over its own octets,
    /// for comparison against names in messages.
    pub fn as_compressed(&self) -> CompressedName {
        CompressedName::new(&self.octets, 0)
    }

    /// Returns an iterator over the labels, ending with the null label.
    pub fn labels(&self) -> wire::Labels {
        wire::labels(&self.octets)
    }

    /// Returns the number of labels, counting the null label.
    pub fn label_count(&self) -> usize {
        wire::label_count(&self.octets)
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        wire::is_root(&self.octets)
    }

    /// Returns whether the first label is `*`.
    pub fn is_wildcard(&self) -> bool {
        wire::is_wildcard(&self.octets)
    }

    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        wire::subdomain(&self.octets, &other.octets)
    }

    /// Returns whether this `Name` is a subdomain of `other` but not
    /// equal to it.
    pub fn strict_subdomain_of(&self, other: &Name) -> bool {
        wire::strict_subdomain(&self.octets, &other.octets)
    }

    /// Returns the superdomain obtained by skipping the first `skip`
    /// labels, or `None` if there aren't enough labels.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        if skip < self.label_count() {
            Some(Self::from_validated(wire::remove_labels(&self.octets, skip)))
        } else {
            None
        }
    }

    /// Returns the closest common ancestor of this `Name` and `other`.
    pub fn shared_topdomain(&self, other: &Name) -> Name {
        Self::from_validated(wire::shared_topdomain(&self.octets, &other.octets))
    }

    /// See [`wire::signature_label_count`].
    pub fn signature_label_count(&self) -> usize {
        wire::signature_label_count(&self.octets)
    }

    /// Makes all ASCII letters in this `Name` lowercase.
    pub fn make_ascii_lowercase(&mut self) {
        wire::lowercase_in_place(&mut self.octets);
    }

    /// Returns the lookup3-based hash of this `Name`, starting from
    /// `seed`. This agrees with [`CompressedName::hash`].
    pub fn hash_value(&self, seed: u32) -> u32 {
        wire::hash(&self.octets, seed)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels().take_while(|label| !label.is_empty()) {
            for octet in label {
                if *octet == b'.' {
                    f.write_str("\\.")?;
                } else if *octet == b'\\' {
                    f.write_str("\\\\")?;
                } else if octet.is_ascii_graphic() {
                    write!(f, "{}", *octet as char)?;
                } else {
                    write!(f, "\\{:03}", *octet)?;
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        wire::compare(&self.octets, &other.octets).is_eq()
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` employs DNSSEC's canonical
/// ordering of domain names (see [`wire::canonical_compare`]).
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        wire::canonical_compare(&self.octets, &other.octets)
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            state.write_u8(label.len() as u8);
            for octet in label {
                state.write_u8(octet.to_ascii_lowercase());
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Allows for conversion of a Rust [`str`] into a [`Name`]. The passed
/// string must be strictly ASCII and fully qualified. Escape sequences
/// as defined by [RFC 4343 § 2.1] are supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root());
        }

        let mut remaining_octets = s.as_bytes();
        let mut builder = NameBuilder::new();
        while let Some(&octet) = remaining_octets.first() {
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&remaining_octets[1..])?;
                builder.try_push(value)?;
                remaining_octets = &remaining_octets[consumed + 1..];
            } else if octet == b'.' {
                builder.next_label()?;
                remaining_octets = &remaining_octets[1..];
            } else if !octet.is_ascii() {
                return Err(Error::StrNotAscii);
            } else {
                builder.try_push(octet)?;
                remaining_octets = &remaining_octets[1..];
            }
        }
        builder.finish()
    }
}

/// Parses an escape sequence, given the octets after the backslash.
/// Returns the value and the number of octets consumed.
fn parse_escape(remaining_octets: &[u8]) -> Result<(u8, usize), Error> {
    match remaining_octets {
        [] => Err(Error::InvalidEscape),
        [d0, d1, d2, ..] if d0.is_ascii_digit() && d1.is_ascii_digit() && d2.is_ascii_digit() => {
            let value = [d0, d1, d2]
                .iter()
                .fold(0usize, |acc, d| acc * 10 + (**d - b'0') as usize);
            u8::try_from(value)
                .map(|value| (value, 3))
                .map_err(|_| Error::InvalidEscape)
        }
        [d0, ..] if d0.is_ascii_digit() => Err(Error::InvalidEscape),
        [octet, ..] => Ok((*octet, 1)),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn std_hash(name: &Name) -> u64 {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.label_count(), 1);
        assert_eq!(root.wire_repr(), &[0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn is_wildcard_works() {
        let wildcard: Name = "*.vigil.test.".parse().unwrap();
        let not_a_wildcard: Name = "vigil.test.".parse().unwrap();
        let inner_asterisk: Name = "x.*.vigil.test.".parse().unwrap();
        assert!(wildcard.is_wildcard());
        assert!(!not_a_wildcard.is_wildcard());
        assert!(!inner_asterisk.is_wildcard());
        assert_eq!(wildcard.signature_label_count(), 2);
    }

    #[test]
    fn superdomain_works() {
        let subdomain: Name = "subdomain.example.test.".parse().unwrap();
        let domain: Name = "example.test.".parse().unwrap();
        assert_eq!(subdomain.superdomain(0).as_ref(), Some(&subdomain));
        assert_eq!(subdomain.superdomain(1), Some(domain));
        assert_eq!(subdomain.superdomain(3), Some(Name::root()));
        assert_eq!(subdomain.superdomain(4), None);
    }

    #[test]
    fn subdomain_relations_work() {
        let www: Name = "www.example.com.".parse().unwrap();
        let example: Name = "EXAMPLE.com.".parse().unwrap();
        assert!(www.eq_or_subdomain_of(&example));
        assert!(www.strict_subdomain_of(&example));
        assert!(example.eq_or_subdomain_of(&example));
        assert!(!example.strict_subdomain_of(&example));
        assert!(!example.eq_or_subdomain_of(&www));
        assert_eq!(
            www.shared_topdomain(&"mail.example.com.".parse().unwrap()),
            example
        );
    }

    #[test]
    fn equality_and_hashing_ignore_case() {
        let a: Name = "WWW.example.com.".parse().unwrap();
        let b: Name = "www.EXAMPLE.com.".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(std_hash(&a), std_hash(&b));
        assert_eq!(a.hash_value(0), b.hash_value(0));
    }

    #[test]
    fn ord_is_canonical() {
        let a: Name = "example.".parse().unwrap();
        let b: Name = "a.example.".parse().unwrap();
        let c: Name = "Z.a.example.".parse().unwrap();
        let d: Name = "z.example.".parse().unwrap();
        let mut names = vec![d.clone(), c.clone(), b.clone(), a.clone()];
        names.sort();
        assert_eq!(names, [a, b, c, d]);
    }

    #[test]
    fn try_from_uncompressed_works() {
        let (name, len) = Name::try_from_uncompressed(b"\x03com\x00rest").unwrap();
        assert_eq!(len, 5);
        assert_eq!(name, "com.".parse().unwrap());
        assert_eq!(
            Name::try_from_uncompressed_all(b"\x03com\x00rest"),
            Err(Error::ExtraData)
        );
        assert_eq!(
            Name::try_from_uncompressed(b"\xc0\x00"),
            Err(Error::PointerNotAllowed)
        );
    }

    #[test]
    fn try_from_compressed_works() {
        let octets = b"\x03com\x00\x07example\xc0\x00";
        let (name, extent) = Name::try_from_compressed(octets, 5).unwrap();
        assert_eq!(name, "example.com.".parse().unwrap());
        assert_eq!(extent, 10);
    }

    #[test]
    fn display_escapes_special_octets() {
        let name = Name::try_from_uncompressed_all(b"\x04a.b\\\x01\x00\x03com\x00").unwrap();
        assert_eq!(name.to_string(), r"a\.b\\.\000.com.");
        assert_eq!(name, name.to_string().parse().unwrap());
    }

    #[test]
    fn fromstr_works() {
        let name: Name = "example.test.".parse().unwrap();
        assert_eq!(name.wire_repr(), b"\x07example\x04test\x00");
        let escaped: Name = "\\000.\\\\\\..".parse().unwrap();
        assert_eq!(escaped.wire_repr(), b"\x01\x00\x02\\.\x00");
    }

    #[test]
    fn fromstr_rejects_invalid_input() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("example".parse::<Name>(), Err(Error::NonNullTerminal));
        assert_eq!("a..b.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!("\\00".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("é.".parse::<Name>(), Err(Error::StrNotAscii));
    }

    #[test]
    fn make_ascii_lowercase_works() {
        let mut name: Name = "UPPERCASE.Domain.Test.".parse().unwrap();
        name.make_ascii_lowercase();
        assert_eq!(name.wire_repr(), b"\x09uppercase\x06domain\x04test\x00");
    }
}
