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

//! Query cache and column views.
//!
//! Keys the cache on the `(include, exclude)` pair directly rather than
//! packing both masks into a single `u64` (`include | (exclude << 32)` would
//! alias two different pairs onto the same key once either mask uses bits
//! past 32, which a 64-component world can reach).

use rustc_hash::FxHashMap;

use crate::archetype::Archetype;
use crate::component::Component;
use crate::registry::TypeRegistry;

fn matches(mask: u64, include: u64, exclude: u64) -> bool {
    (mask & include) == include && (exclude == 0 || (mask & exclude) == 0)
}

/// Cache from `(include, exclude)` mask pairs to the archetype indices that
/// satisfy the predicate. Populated incrementally: each newly created
/// archetype is pushed into every existing entry it matches (see
/// `World::find_or_create_archetype`), so a read never has to rescan.
#[derive(Default)]
pub(crate) struct QueryCache {
    entries: FxHashMap<(u64, u64), Vec<u32>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (scanning on first miss) the matches for `(include, exclude)`.
    pub fn get_or_scan(&mut self, include: u64, exclude: u64, archetypes: &[Archetype]) -> &[u32] {
        self.entries.entry((include, exclude)).or_insert_with(|| {
            archetypes
                .iter()
                .enumerate()
                .filter_map(|(i, arch)| matches(arch.mask(), include, exclude).then_some(i as u32))
                .collect()
        })
    }

    /// Extend every existing cache entry the new archetype satisfies.
    pub fn register_new_archetype(&mut self, index: u32, mask: u64) {
        for (&(include, exclude), matches_list) in self.entries.iter_mut() {
            if matches(mask, include, exclude) {
                matches_list.push(index);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One archetype satisfying a query, paired with its index in `World`.
pub struct TableMatch<'a> {
    pub archetype: &'a Archetype,
    pub index: u32,
}

/// Checked column view: resolves `T`'s bit through the registry, then looks
/// it up in `archetype`. `None` if `T` is unregistered or the archetype
/// lacks that column; an archetype with zero rows still yields `Some(&[])`.
pub fn column_checked<'a, T: Component>(
    archetype: &'a Archetype,
    registry: &TypeRegistry,
) -> Option<&'a [T]> {
    let bit = registry.bit::<T>()?;
    column_with_bit(archetype, bit)
}

pub fn column_checked_mut<'a, T: Component>(
    archetype: &'a mut Archetype,
    registry: &TypeRegistry,
) -> Option<&'a mut [T]> {
    let bit = registry.bit::<T>()?;
    column_with_bit_mut(archetype, bit)
}

/// Column view given a pre-computed bit, skipping the registry round-trip.
pub fn column_with_bit<'a, T: Component>(archetype: &'a Archetype, bit: u64) -> Option<&'a [T]> {
    let column = archetype.column(bit)?;
    Some(unsafe { column.as_slice::<T>() })
}

pub fn column_with_bit_mut<'a, T: Component>(
    archetype: &'a mut Archetype,
    bit: u64,
) -> Option<&'a mut [T]> {
    let column = archetype.column_mut(bit)?;
    Some(unsafe { column.as_slice_mut::<T>() })
}

/// Column view with no presence check.
///
/// # Safety
/// Caller must ensure `archetype` actually has a column for `bit` and that
/// `T` matches that column's registered type.
pub unsafe fn column_unchecked<'a, T: Component>(archetype: &'a Archetype, bit: u64) -> &'a [T] {
    archetype.column(bit).unwrap_unchecked().as_slice::<T>()
}

/// # Safety
/// See [`column_unchecked`].
pub unsafe fn column_unchecked_mut<'a, T: Component>(
    archetype: &'a mut Archetype,
    bit: u64,
) -> &'a mut [T] {
    archetype
        .column_mut(bit)
        .unwrap_unchecked()
        .as_slice_mut::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_predicate() {
        assert!(matches(0b111, 0b101, 0));
        assert!(!matches(0b111, 0b1000, 0));
        assert!(matches(0b011, 0b001, 0b100));
        assert!(!matches(0b111, 0b001, 0b100));
    }

    #[test]
    fn cache_extends_on_new_archetype() {
        let mut cache = QueryCache::new();
        // Seed an entry with no archetypes yet.
        assert!(cache.get_or_scan(0b1, 0, &[]).is_empty());
        cache.register_new_archetype(0, 0b1);
        assert_eq!(cache.get_or_scan(0b1, 0, &[]), &[0]);
    }
}
