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

//! Implementation of the [`NameBuilder`] structure.

use arrayvec::ArrayVec;

use super::{wire, Error, Name, MAX_LABEL_LEN, MAX_WIRE_LEN};

/// A facility to build [`Name`]s label by label.
///
/// The `NameBuilder` accumulates the on-the-wire representation in a
/// fixed-size buffer long enough for any valid name, so only the final
/// [`Name`] is heap-allocated. It starts with a single null label;
/// finishing at that point yields the root:
///
/// ```
/// use vigil::name::{Name, NameBuilder};
/// assert_eq!(NameBuilder::new().finish().unwrap(), Name::root());
/// ```
///
/// Octets are added to the current label with [`NameBuilder::try_push`]
/// and [`NameBuilder::try_push_slice`], and a new label is started with
/// [`NameBuilder::next_label`]. Any call that would produce an invalid
/// name fails and leaves the builder unchanged.
///
/// [`NameBuilder::finish_with_suffix`] completes the name with the
/// labels of another name:
///
/// ```
/// use vigil::name::{Name, NameBuilder};
/// let target: Name = "example.net.".parse().unwrap();
/// let mut builder = NameBuilder::new();
/// builder.try_push_slice(b"www").unwrap();
/// let name = builder.finish_with_suffix(&target).unwrap();
/// assert_eq!(name, "www.example.net.".parse().unwrap());
/// ```
///
/// [`NameBuilder::finish_onto`] does the same after whole labels pushed
/// with [`NameBuilder::try_push_label`]. DNAME substitution uses it.
pub struct NameBuilder {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_start: usize,
    label_len: u8,
}

impl NameBuilder {
    /// Constructs a new `NameBuilder`, which initially contains a
    /// single null label.
    pub fn new() -> Self {
        let mut wire_repr = ArrayVec::new();
        wire_repr.push(0);
        Self {
            wire_repr,
            label_start: 0,
            label_len: 0,
        }
    }

    /// Determines whether the name currently stored in the
    /// `NameBuilder` ends with the null label.
    pub fn is_fully_qualified(&self) -> bool {
        self.label_len == 0
    }

    /// Tries to add the given octet to the current label.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.label_len as usize >= MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_push(octet).is_ok() {
            self.label_len += 1;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Tries to add the given slice to the current label.
    pub fn try_push_slice(&mut self, octets: &[u8]) -> Result<(), Error> {
        if self.label_len as usize + octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_extend_from_slice(octets).is_ok() {
            self.label_len += octets.len() as u8;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Tries to append a whole label, starting a new label after it.
    pub fn try_push_label(&mut self, label: &[u8]) -> Result<(), Error> {
        if !self.is_fully_qualified() {
            return Err(Error::NonNullTerminal);
        }
        let saved_len = self.wire_repr.len();
        let result = self.try_push_slice(label).and_then(|_| self.next_label());
        if result.is_err() {
            self.wire_repr.truncate(saved_len);
            self.label_len = 0;
        }
        result
    }

    fn update_label_len(&mut self) {
        self.wire_repr[self.label_start] = self.label_len;
    }

    /// Finishes the current label and starts a new one. Only the last
    /// label may be null, so this fails if the current label is empty.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else if self.wire_repr.is_full() {
            Err(Error::NameTooLong)
        } else {
            self.update_label_len();
            self.label_start = self.wire_repr.len();
            self.label_len = 0;
            self.wire_repr.push(0);
            Ok(())
        }
    }

    /// Finishes the construction of the domain name, consuming the
    /// `NameBuilder`. The current label must be the null label.
    pub fn finish(self) -> Result<Name, Error> {
        if !self.is_fully_qualified() {
            Err(Error::NonNullTerminal)
        } else {
            Ok(Name::from_validated(&self.wire_repr))
        }
    }

    /// Finishes the current label and appends the labels of `suffix`.
    /// The current label must not be null.
    pub fn finish_with_suffix(mut self, suffix: &Name) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else {
            self.update_label_len();
            self.wire_repr
                .try_extend_from_slice(suffix.wire_repr())
                .map_err(|_| Error::NameTooLong)?;
            Ok(Name::from_validated(&self.wire_repr))
        }
    }

    /// Like [`NameBuilder::finish_with_suffix`], but the builder may
    /// hold any number of complete labels (including none) followed by
    /// the null label, which is replaced by `suffix`.
    pub fn finish_onto(mut self, suffix: &Name) -> Result<Name, Error> {
        if !self.is_fully_qualified() {
            return Err(Error::NonNullTerminal);
        }
        self.wire_repr.pop();
        self.wire_repr
            .try_extend_from_slice(suffix.wire_repr())
            .map_err(|_| Error::NameTooLong)?;
        debug_assert!(wire::validate_all(&self.wire_repr).is_ok());
        Ok(Name::from_validated(&self.wire_repr))
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::MAX_N_LABELS;

    #[test]
    fn namebuilder_works() {
        let mut builder = NameBuilder::new();
        for c in b"example".iter() {
            builder.try_push(*c).unwrap();
        }
        builder.next_label().unwrap();
        builder.try_push_slice(b"test").unwrap();
        builder.next_label().unwrap();
        let name = builder.finish().unwrap();
        assert_eq!(name, "example.test.".parse().unwrap());
    }

    #[test]
    fn finish_rejects_non_fqdn() {
        let mut builder = NameBuilder::new();
        builder.try_push(b'x').unwrap();
        assert_eq!(builder.finish(), Err(Error::NonNullTerminal));
    }

    #[test]
    fn finish_with_suffix_rejects_fqdn() {
        let mut builder = NameBuilder::new();
        let suffix: Name = "test.".parse().unwrap();
        builder.try_push(b'x').unwrap();
        builder.next_label().unwrap();
        assert_eq!(
            builder.finish_with_suffix(&suffix),
            Err(Error::NullNonTerminal)
        );
    }

    #[test]
    fn finish_onto_prepends_labels() {
        let suffix: Name = "example.net.".parse().unwrap();
        let mut builder = NameBuilder::new();
        builder.try_push_label(b"a").unwrap();
        builder.try_push_label(b"www").unwrap();
        assert_eq!(
            builder.finish_onto(&suffix).unwrap(),
            "a.www.example.net.".parse().unwrap()
        );
        assert_eq!(NameBuilder::new().finish_onto(&suffix).unwrap(), suffix);
    }

    #[test]
    fn finish_onto_rejects_long_result() {
        let suffix: Name = format!("{0}.{0}.{0}.", "x".repeat(63)).parse().unwrap();
        let mut builder = NameBuilder::new();
        builder.try_push_label(&[b'y'; 63]).unwrap();
        assert_eq!(builder.finish_onto(&suffix), Err(Error::NameTooLong));
    }

    #[test]
    fn try_push_rejects_long_label() {
        let mut builder = NameBuilder::new();
        for _ in 0..MAX_LABEL_LEN {
            builder.try_push(b'x').unwrap();
        }
        assert_eq!(builder.try_push(b'x'), Err(Error::LabelTooLong));
        assert_eq!(builder.try_push_slice(b"x"), Err(Error::LabelTooLong));
    }

    #[test]
    fn try_push_rejects_long_name() {
        let mut builder = NameBuilder::new();
        for _ in 0..MAX_N_LABELS - 1 {
            builder.try_push(b'x').unwrap();
            builder.next_label().unwrap();
        }

        // Only the null label fits now.
        assert_eq!(builder.try_push(b'x'), Err(Error::NameTooLong));
        assert_eq!(builder.finish().unwrap().label_count(), MAX_N_LABELS);
    }

    #[test]
    fn try_push_label_leaves_builder_unchanged_on_failure() {
        let mut builder = NameBuilder::new();
        assert_eq!(
            builder.try_push_label(&[b'x'; 64]),
            Err(Error::LabelTooLong)
        );
        assert!(builder.is_fully_qualified());
        assert_eq!(builder.finish().unwrap(), Name::root());
    }
}
