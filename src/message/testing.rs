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

//! Construction of uncompressed wire-format messages for tests.

use super::constants::*;
use super::Section;
use crate::class::Class;
use crate::name::Name;
use crate::rr::Type;

/// Builds a message one record at a time. Records must be added in
/// section order.
pub struct PacketBuilder {
    octets: Vec<u8>,
    counts: [u16; 4],
}

impl PacketBuilder {
    /// Starts a message with ID 0 and the given header flags.
    pub fn response(flags: u16) -> Self {
        let mut octets = vec![0; HEADER_SIZE];
        octets[FLAGS_START..FLAGS_START + 2].copy_from_slice(&flags.to_be_bytes());
        Self {
            octets,
            counts: [0; 4],
        }
    }

    pub fn question(mut self, qname: &str, qtype: Type, qclass: Class) -> Self {
        self.octets.extend_from_slice(&wire(qname));
        self.octets.extend_from_slice(&u16::from(qtype).to_be_bytes());
        self.octets.extend_from_slice(&u16::from(qclass).to_be_bytes());
        self.counts[0] += 1;
        self
    }

    /// Adds a record of class IN.
    pub fn rr(self, section: Section, owner: &str, rr_type: Type, ttl: u32, rdata: &[u8]) -> Self {
        self.rr_with_class(section, owner, rr_type, Class::IN, ttl, rdata)
    }

    pub fn rr_with_class(
        mut self,
        section: Section,
        owner: &str,
        rr_type: Type,
        class: Class,
        ttl: u32,
        rdata: &[u8],
    ) -> Self {
        self.octets.extend_from_slice(&wire(owner));
        self.octets.extend_from_slice(&u16::from(rr_type).to_be_bytes());
        self.octets.extend_from_slice(&u16::from(class).to_be_bytes());
        self.octets.extend_from_slice(&ttl.to_be_bytes());
        self.octets.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        self.octets.extend_from_slice(rdata);
        let index = match section {
            Section::Answer => 1,
            Section::Authority => 2,
            Section::Additional => 3,
        };
        self.counts[index] += 1;
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        let starts = [QDCOUNT_START, ANCOUNT_START, NSCOUNT_START, ARCOUNT_START];
        for (start, count) in starts.into_iter().zip(self.counts) {
            self.octets[start..start + 2].copy_from_slice(&count.to_be_bytes());
        }
        self.octets
    }
}

/// Returns the uncompressed wire form of a name.
pub fn wire(name: &str) -> Vec<u8> {
    name.parse::<Name>().unwrap().wire_repr().to_vec()
}

/// Returns MX (or KX) RDATA.
pub fn mx_rdata(preference: u16, exchange: &str) -> Vec<u8> {
    let mut rdata = preference.to_be_bytes().to_vec();
    rdata.extend_from_slice(&wire(exchange));
    rdata
}
