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

//! Caching of DNS data.
//!
//! [`LruHash`] is a generic concurrent hash table with LRU eviction
//! under a memory budget. It knows nothing about DNS: an
//! [`EntryPolicy`] tells it how to size, compare, and dispose of its
//! entries. The [`rrset`] module builds the RRset cache on top of it.

mod lruhash;
pub mod rrset;

pub use lruhash::{EntryPolicy, Error, LruHash, ReadGuard, WriteGuard};
