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

//! Vigil is the message-processing core of a caching DNS resolver.
//!
//! It provides three cooperating pieces:
//!
//! * [`name`]: parsing, comparison, and hashing of domain names, both
//!   standalone and embedded (possibly compressed) in received
//!   messages;
//! * [`scrub`]: normalization and sanitization of parsed responses
//!   (see [`message`]) before they are trusted; and
//! * [`cache`]: a concurrent, memory-bounded LRU hash table and the
//!   RRset cache built on top of it.

pub mod cache;
pub mod class;
pub mod lookup3;
pub mod message;
pub mod name;
pub mod rr;
pub mod scrub;
pub mod util;
