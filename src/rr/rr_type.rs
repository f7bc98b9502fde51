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

//! Provides the [`Type`] structure for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is represented on the wire as an unsigned 16-bit integer.
/// Hence this is basically a wrapper around `u16` with
/// [`Display`](fmt::Display) and [`FromStr`] implementations for the
/// mnemonics (falling back to the `TYPEnnn` form of [RFC 3597 § 5]),
/// plus the per-type knowledge the scrubber and cache need about
/// domain names embedded in RDATA.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

macro_rules! rr_types {
    ($($name:ident = $value:literal,)*) => {
        impl Type {
            $(pub const $name: Type = Type($value);)*

            fn mnemonic(self) -> Option<&'static str> {
                match self {
                    $(Self::$name => Some(stringify!($name)),)*
                    _ => None,
                }
            }

            fn from_mnemonic(text: &str) -> Option<Self> {
                $(
                    if Caseless(text) == Caseless(stringify!($name)) {
                        return Some(Self::$name);
                    }
                )*
                None
            }
        }
    };
}

rr_types! {
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,
    PTR = 12,
    MINFO = 14,
    MX = 15,
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    RT = 21,
    AAAA = 28,
    SRV = 33,
    NAPTR = 35,
    KX = 36,
    DNAME = 39,
    OPT = 41,
    DS = 43,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    NSEC3 = 50,
    TSIG = 250,
    IXFR = 251,
    AXFR = 252,
    ANY = 255,
}

impl Type {
    /// For types whose RDATA names a host that should come with address
    /// records in the additional section ([RFC 1035 § 3.3], [RFC 2782],
    /// [RFC 2230]), returns the offset of that name within the RDATA.
    ///
    /// [RFC 1035 § 3.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3
    /// [RFC 2782]: https://datatracker.ietf.org/doc/html/rfc2782
    /// [RFC 2230]: https://datatracker.ietf.org/doc/html/rfc2230
    pub fn additional_name_offset(self) -> Option<usize> {
        match self {
            Self::MB | Self::MD | Self::MF | Self::NS => Some(0),
            Self::MX | Self::KX => Some(2),
            Self::SRV => Some(6),
            _ => None,
        }
    }

    /// Describes where (possibly compressed) domain names sit in RDATA
    /// of this type. Each entry is the number of octets before a name,
    /// counted from the end of the previous name or, for the first
    /// entry, from the start of the RDATA. SOA, for example, starts with
    /// two names back to back.
    pub fn embedded_names(self) -> &'static [usize] {
        match self {
            Self::NS
            | Self::MD
            | Self::MF
            | Self::CNAME
            | Self::MB
            | Self::MG
            | Self::MR
            | Self::PTR
            | Self::DNAME => &[0],
            Self::MX | Self::KX | Self::RT | Self::AFSDB => &[2],
            Self::SOA | Self::MINFO | Self::RP => &[0, 0],
            Self::SRV => &[6],
            _ => &[],
        }
    }

    /// Returns whether this is an address type (A or AAAA).
    pub fn is_address(self) -> bool {
        self == Self::A || self == Self::AAAA
    }
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(rr_type) = Self::from_mnemonic(text) {
            return Ok(rr_type);
        }
        match text.get(0..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("TYPE") => text[4..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("type value is not a valid unsigned 16-bit integer")),
            _ => Err("unknown type"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_displays_according_to_rfc3597() {
        assert_eq!(Type::from(0xff00).to_string(), "TYPE65280");
        assert_eq!(Type::DNAME.to_string(), "DNAME");
    }

    #[test]
    fn type_parses_mnemonics_and_generic_form() {
        assert_eq!("cname".parse::<Type>(), Ok(Type::CNAME));
        assert_eq!("TYPE1".parse::<Type>(), Ok(Type::A));
        assert_eq!(u16::from("TYPE65280".parse::<Type>().unwrap()), 65280);
        assert!("TYPE65536".parse::<Type>().is_err());
        assert!("BOGUS".parse::<Type>().is_err());
    }

    #[test]
    fn additional_name_offsets_are_correct() {
        assert_eq!(Type::NS.additional_name_offset(), Some(0));
        assert_eq!(Type::MX.additional_name_offset(), Some(2));
        assert_eq!(Type::KX.additional_name_offset(), Some(2));
        assert_eq!(Type::SRV.additional_name_offset(), Some(6));
        assert_eq!(Type::NAPTR.additional_name_offset(), None);
        assert_eq!(Type::CNAME.additional_name_offset(), None);
    }
}
