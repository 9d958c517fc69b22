// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Iterate the set bits of a component mask.
//!
//! A component mask is always a single `u64` (the `N <= 64` structural
//! limit), so this is a trailing-zeros walk over one word rather than a
//! general-purpose bit-vector.

/// Iterator over the set bit *indices* of a `u64` mask, ascending.
pub struct OnesIter {
    remaining: u64,
}

impl OnesIter {
    pub fn new(mask: u64) -> Self {
        Self { remaining: mask }
    }
}

impl Iterator for OnesIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let trailing = self.remaining.trailing_zeros();
        self.remaining &= self.remaining - 1;
        Some(trailing as usize)
    }
}

pub fn bit_indices(mask: u64) -> OnesIter {
    OnesIter::new(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_ascending_set_bits() {
        let indices: Vec<usize> = bit_indices(0b1011).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn empty_mask_yields_nothing() {
        assert_eq!(bit_indices(0).count(), 0);
    }
}
