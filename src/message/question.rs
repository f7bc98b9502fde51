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

//! Implementation of the [`QueryInfo`] type.

use std::fmt;

use crate::class::Class;
use crate::name::Name;
use crate::rr::Type;

/// The question a resolver asked: the tuple a response must answer.
///
/// Per [RFC 1035 § 4.1.2] a question holds a QNAME, a QTYPE and a
/// QCLASS. QTYPEs are a superset of RR types; the only extra one the
/// scrubber cares about is `*` ([`Type::ANY`]), so [`Type`] serves for
/// both.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryInfo {
    pub qname: Name,
    pub qtype: Type,
    pub qclass: Class,
}

impl QueryInfo {
    pub fn new(qname: Name, qtype: Type, qclass: Class) -> Self {
        Self {
            qname,
            qtype,
            qclass,
        }
    }
}

impl fmt::Display for QueryInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_in_zone_file_order() {
        let query = QueryInfo::new("example.com.".parse().unwrap(), Type::A, Class::IN);
        assert_eq!(query.to_string(), "example.com. IN A");
    }
}
