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

//! DNS message handling: header constants, the question a resolver
//! asked, and the parse model that received responses are read into.

pub mod constants;
pub mod parse;
mod question;
mod rcode;
#[cfg(test)]
pub(crate) mod testing;
pub use parse::{
    hash_rrset, parse_packet, EdnsData, MsgParse, Owner, ParseError, Rdata, RrParse,
    RrsetHandle, RrsetParse, Section,
};
pub use question::QueryInfo;
pub use rcode::Rcode;
