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

//! Constants related to DNS messages.

pub const HEADER_SIZE: usize = 12;
pub const ID_START: usize = 0;
pub const FLAGS_START: usize = 2;
pub const QDCOUNT_START: usize = 4;
pub const ANCOUNT_START: usize = 6;
pub const NSCOUNT_START: usize = 8;
pub const ARCOUNT_START: usize = 10;

// Masks over the 16-bit flags word of the header, in host order.
pub const QR_MASK: u16 = 0x8000;
pub const OPCODE_MASK: u16 = 0x7800;
pub const OPCODE_SHIFT: u32 = 11;
pub const AA_MASK: u16 = 0x0400;
pub const TC_MASK: u16 = 0x0200;
pub const RD_MASK: u16 = 0x0100;
pub const RA_MASK: u16 = 0x0080;
pub const AD_MASK: u16 = 0x0020;
pub const CD_MASK: u16 = 0x0010;
pub const RCODE_MASK: u16 = 0x000f;

/// The largest offset a compression pointer can encode.
pub const POINTER_MAX: usize = 16383;

/// The number of buckets in the parse-time rrset hash table.
pub const PARSE_TABLE_SIZE: usize = 1024;

/// The DO bit in the flags half of an OPT record's TTL field.
pub const EDNS_DO_MASK: u16 = 0x8000;

/// The seed for hashing rrsets during parsing.
pub const RRSET_HASH_SEED: u32 = 0xab;
