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

//! World: central entity and archetype storage.
//!
//! One struct owns entity locations, the archetype vector, the archetype
//! index, the event queues, and the resources record, keyed on a fixed
//! component bitmask rather than an unbounded signature. `R` is a
//! caller-supplied resources record instead of a type-erased resource map.

use rustc_hash::FxHashMap;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::Archetype;
use crate::bitset;
use crate::component::{Bundle, Component};
use crate::entity::{Entity, EntityDirectory};
use crate::error::Result;
use crate::event::EventQueues;
use crate::query::{self, QueryCache, TableMatch};
use crate::registry::TypeRegistry;

/// Central ECS world. `R` is a user-defined resources record, `()` by default.
pub struct World<R = ()> {
    registry: TypeRegistry,
    directory: EntityDirectory,
    archetypes: Vec<Archetype>,
    archetype_by_mask: FxHashMap<u64, u32>,
    query_cache: QueryCache,
    despawn_queue: Vec<Entity>,
    events: EventQueues,
    resources: R,
}

impl<R> World<R> {
    /// Construct a world around a frozen `registry` and a `resources` value.
    /// The empty-mask archetype is never created: a bundle with no
    /// components short-circuits to `Entity::NIL` in `spawn`, and `remove`
    /// despawns rather than migrating to an empty archetype, so mask `0`
    /// never needs a table to land in.
    pub fn new(registry: TypeRegistry, resources: R) -> Self {
        Self {
            registry,
            directory: EntityDirectory::new(),
            archetypes: Vec::new(),
            archetype_by_mask: FxHashMap::default(),
            query_cache: QueryCache::new(),
            despawn_queue: Vec::new(),
            events: EventQueues::new(),
            resources,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut R {
        &mut self.resources
    }

    pub fn entity_count(&self) -> usize {
        self.directory.len()
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn archetype(&self, index: u32) -> Option<&Archetype> {
        self.archetypes.get(index as usize)
    }

    // ---------------------------------------------------------------
    // Archetype lookup and creation
    // ---------------------------------------------------------------

    fn find_or_create_archetype(&mut self, mask: u64) -> u32 {
        if let Some(&index) = self.archetype_by_mask.get(&mask) {
            return index;
        }

        let infos: Vec<_> = bitset::bit_indices(mask)
            .map(|bit_index| self.registry.info_at(bit_index))
            .collect();
        let archetype = Archetype::new(mask, &infos);
        self.archetypes.push(archetype);
        let new_index = (self.archetypes.len() - 1) as u32;
        self.archetype_by_mask.insert(mask, new_index);

        self.query_cache.register_new_archetype(new_index, mask);

        for bit_index in 0..self.registry.len() {
            let bit = 1u64 << bit_index;
            for existing in &mut self.archetypes[..new_index as usize] {
                let existing_mask = existing.mask();
                if existing_mask | bit == mask {
                    existing.set_add_edge(bit_index, new_index);
                }
                if bit & existing_mask != 0 && existing_mask & !bit == mask {
                    existing.set_remove_edge(bit_index, new_index);
                }
            }
        }

        new_index
    }

    // ---------------------------------------------------------------
    // Spawn operations
    // ---------------------------------------------------------------

    /// Spawn an entity bearing every component in `bundle`. An empty bundle
    /// (`()`) returns `Entity::NIL` without touching any archetype.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Result<Entity> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.spawn").entered();

        let type_ids = B::type_ids();
        if type_ids.is_empty() {
            return Ok(Entity::NIL);
        }

        let mask = B::mask(&self.registry);
        let archetype_index = self.find_or_create_archetype(mask);
        let entity = self.directory.allocate()?;
        let archetype = &mut self.archetypes[archetype_index as usize];
        let row = archetype.append_row(entity)?;

        let mut ptrs: smallvec::SmallVec<[*mut u8; crate::component::MAX_BUNDLE_COMPONENTS]> =
            smallvec::SmallVec::new();
        for type_id in &type_ids {
            let bit = self
                .registry
                .bit_of_type_id(*type_id)
                .unwrap_or_else(|| panic!("component type {type_id:?} was never registered with this world's TypeRegistry"));
            let column = archetype.column_mut(bit).expect("column missing for bundle bit");
            ptrs.push(column.row_ptr_mut(row));
        }
        unsafe {
            bundle.write_components(&ptrs);
        }

        self.directory.set_location(entity, archetype_index, row as u32);
        Ok(entity)
    }

    /// Spawn `count` entities, each bearing a clone of `init_value` as its
    /// sole component of type `T`.
    pub fn spawn_batch<T: Component + Clone>(
        &mut self,
        count: usize,
        init_value: T,
    ) -> Result<Vec<Entity>> {
        let bit = self.registry.bit_of_or_panic::<T>();
        let archetype_index = self.find_or_create_archetype(bit);

        self.directory.reserve(count)?;
        self.archetypes[archetype_index as usize].reserve_rows(count)?;

        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = self.directory.allocate()?;
            let archetype = &mut self.archetypes[archetype_index as usize];
            let row = archetype.append_row(entity)?;
            let column = archetype.column_mut(bit).expect("column missing for T");
            unsafe {
                std::ptr::write(column.row_ptr_mut(row) as *mut T, init_value.clone());
            }
            self.directory.set_location(entity, archetype_index, row as u32);
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Spawn `count` entities directly into the archetype for `mask`, with
    /// every component column zero-filled. See the design notes for why
    /// this implementation zero-fills rather than leaving bytes undefined.
    pub fn spawn_with_mask(&mut self, mask: u64, count: usize) -> Result<Vec<Entity>> {
        let archetype_index = self.find_or_create_archetype(mask);

        self.directory.reserve(count)?;
        self.archetypes[archetype_index as usize].reserve_rows(count)?;

        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = self.directory.allocate()?;
            let row = self.archetypes[archetype_index as usize].append_row(entity)?;
            self.directory.set_location(entity, archetype_index, row as u32);
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Like [`spawn_with_mask`](Self::spawn_with_mask), then invokes
    /// `init_fn(archetype, row)` for each newly created row so callers can
    /// write real component values through the table's column accessors.
    pub fn spawn_batch_with_init<F>(
        &mut self,
        mask: u64,
        count: usize,
        mut init_fn: F,
    ) -> Result<Vec<Entity>>
    where
        F: FnMut(&mut Archetype, usize),
    {
        let archetype_index = self.find_or_create_archetype(mask);

        self.directory.reserve(count)?;
        self.archetypes[archetype_index as usize].reserve_rows(count)?;

        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = self.directory.allocate()?;
            let archetype = &mut self.archetypes[archetype_index as usize];
            let row = archetype.append_row(entity)?;
            init_fn(archetype, row);
            self.directory.set_location(entity, archetype_index, row as u32);
            entities.push(entity);
        }
        Ok(entities)
    }

    // ---------------------------------------------------------------
    // Component access
    // ---------------------------------------------------------------

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.directory.is_valid(entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let location = self.directory.location(entity)?;
        let bit = self.registry.bit::<T>()?;
        let archetype = self.archetypes.get(location.archetype_index as usize)?;
        query::column_with_bit::<T>(archetype, bit).map(|slice| &slice[location.row as usize])
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let location = self.directory.location(entity)?;
        let bit = self.registry.bit::<T>()?;
        let archetype = self.archetypes.get_mut(location.archetype_index as usize)?;
        query::column_with_bit_mut::<T>(archetype, bit).map(|slice| &mut slice[location.row as usize])
    }

    /// No-validation component access for hot loops that already proved
    /// liveness and presence via a query.
    ///
    /// # Safety
    /// `entity` must be live and its archetype must have a column for `T`.
    pub unsafe fn get_unchecked<T: Component>(&self, entity: Entity) -> &T {
        let location = self.directory.location(entity).unwrap_unchecked();
        let bit = self.registry.bit::<T>().unwrap_unchecked();
        let archetype = self.archetypes.get_unchecked(location.archetype_index as usize);
        query::column_unchecked::<T>(archetype, bit)
            .get_unchecked(location.row as usize)
    }

    /// Overwrite `entity`'s existing `T` value. Returns `false` (no-op) if
    /// `entity` is not live or lacks `T`; never adds a missing component.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        match self.get_mut::<T>(entity) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        let Some(bit) = self.registry.bit::<T>() else {
            return false;
        };
        self.has_components(entity, bit)
    }

    pub fn has_components(&self, entity: Entity, mask: u64) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        self.archetypes[location.archetype_index as usize].has_all(mask)
    }

    pub fn component_mask(&self, entity: Entity) -> Option<u64> {
        let location = self.directory.location(entity)?;
        Some(self.archetypes[location.archetype_index as usize].mask())
    }

    // ---------------------------------------------------------------
    // Structural mutation
    // ---------------------------------------------------------------

    /// Add `value: T` to `entity`. If `T` is already present, overwrites it
    /// in place and returns `true`. Otherwise migrates `entity` to the
    /// archetype for `mask | bit(T)`, following (and caching) `add_edges`.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<bool> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.add").entered();

        let Some(location) = self.directory.location(entity) else {
            return Ok(false);
        };
        let bit = self.registry.bit_of_or_panic::<T>();
        let src_index = location.archetype_index;
        let src_row = location.row as usize;

        if let Some(column) = self.archetypes[src_index as usize].column_mut(bit) {
            // The cell already holds a live `T` (unlike a freshly grown,
            // zero-filled row), so assign through the pointer rather than
            // `ptr::write` to run the old value's destructor instead of
            // leaking it.
            unsafe {
                *(column.row_ptr_mut(src_row) as *mut T) = value;
            }
            return Ok(true);
        }

        let bit_index = bit.trailing_zeros() as usize;
        let src_mask = self.archetypes[src_index as usize].mask();
        let new_mask = src_mask | bit;
        let dst_index = match self.archetypes[src_index as usize].add_edge(bit_index) {
            Some(target) => target,
            None => {
                let target = self.find_or_create_archetype(new_mask);
                self.archetypes[src_index as usize].set_add_edge(bit_index, target);
                target
            }
        };

        let dst_row = self.migrate_row(src_index, src_row, dst_index, entity)?;

        let dst_column = self.archetypes[dst_index as usize]
            .column_mut(bit)
            .expect("destination archetype missing new component's column");
        unsafe {
            std::ptr::write(dst_column.row_ptr_mut(dst_row) as *mut T, value);
        }

        self.directory.set_location(entity, dst_index, dst_row as u32);
        Ok(true)
    }

    /// Remove `T` from `entity`. Returns `false` if `entity` is not live or
    /// lacks `T`. If removing `T` empties the mask, despawns `entity`
    /// instead of migrating to a (non-existent) empty archetype.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<bool> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.remove").entered();

        let Some(location) = self.directory.location(entity) else {
            return Ok(false);
        };
        let bit = self.registry.bit_of_or_panic::<T>();
        let src_index = location.archetype_index;
        let src_row = location.row as usize;
        let src_mask = self.archetypes[src_index as usize].mask();

        if src_mask & bit == 0 {
            return Ok(false);
        }

        let new_mask = src_mask & !bit;
        if new_mask == 0 {
            return Ok(self.despawn(entity));
        }

        let bit_index = bit.trailing_zeros() as usize;
        let dst_index = match self.archetypes[src_index as usize].remove_edge(bit_index) {
            Some(target) => target,
            None => {
                let target = self.find_or_create_archetype(new_mask);
                self.archetypes[src_index as usize].set_remove_edge(bit_index, target);
                target
            }
        };

        let dst_row = self.migrate_row(src_index, src_row, dst_index, entity)?;
        self.directory.set_location(entity, dst_index, dst_row as u32);
        Ok(true)
    }

    /// Copy every shared column from `src_index`'s row `src_row` into a
    /// freshly appended row of `dst_index`, then swap-remove the vacated
    /// source row — dropping only the columns that were NOT carried over
    /// (see `Archetype::swap_remove_row_for_migration`).
    fn migrate_row(
        &mut self,
        src_index: u32,
        src_row: usize,
        dst_index: u32,
        entity: Entity,
    ) -> Result<usize> {
        let (src, dst) = borrow_two_mut(&mut self.archetypes, src_index as usize, dst_index as usize);
        let dst_row = dst.append_row(entity)?;
        let shared_mask = src.mask() & dst.mask();
        for bit_index in bitset::bit_indices(shared_mask) {
            let bit = 1u64 << bit_index;
            let elem_size = src.column(bit).unwrap().elem_size();
            let src_ptr = src.column(bit).unwrap().row_ptr(src_row);
            let dst_ptr = dst.column_mut(bit).unwrap().row_ptr_mut(dst_row);
            unsafe {
                std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, elem_size);
            }
        }

        if let Some(swapped) = self.archetypes[src_index as usize]
            .swap_remove_row_for_migration(src_row, shared_mask)
        {
            self.directory.set_row(swapped, src_row as u32);
        }
        Ok(dst_row)
    }

    // ---------------------------------------------------------------
    // Despawn, deferred despawn
    // ---------------------------------------------------------------

    /// Despawn `entity` immediately. Returns `false` (no state change) if
    /// `entity` was not live.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let archetype = &mut self.archetypes[location.archetype_index as usize];
        if let Some(swapped) = archetype.swap_remove_row(location.row as usize) {
            self.directory.set_row(swapped, location.row);
        }
        self.directory.retire(entity);
        true
    }

    pub fn queue_despawn(&mut self, entity: Entity) {
        self.despawn_queue.push(entity);
    }

    /// Despawn every queued entity, in order, then clear the queue. Stale or
    /// duplicate entries are silently skipped (the generational check in
    /// `despawn` already makes them no-ops).
    pub fn apply_despawns(&mut self) {
        let queued = std::mem::take(&mut self.despawn_queue);
        for entity in queued {
            self.despawn(entity);
        }
    }

    // ---------------------------------------------------------------
    // Query layer
    // ---------------------------------------------------------------

    pub fn matching_archetypes(&mut self, include: u64, exclude: u64) -> &[u32] {
        self.query_cache.get_or_scan(include, exclude, &self.archetypes)
    }

    pub fn count(&mut self, include: u64, exclude: u64) -> usize {
        self.matching_archetypes(include, exclude)
            .iter()
            .map(|&index| self.archetypes[index as usize].len())
            .sum()
    }

    pub fn first(&mut self, include: u64, exclude: u64) -> Option<Entity> {
        for &index in self.matching_archetypes(include, exclude) {
            let archetype = &self.archetypes[index as usize];
            if let Some(&entity) = archetype.entities().first() {
                return Some(entity);
            }
        }
        None
    }

    pub fn entities(&mut self, include: u64, exclude: u64) -> Vec<Entity> {
        let mut out = Vec::new();
        for &index in self.matching_archetypes(include, exclude) {
            out.extend_from_slice(self.archetypes[index as usize].entities());
        }
        out
    }

    /// Iterate over `(archetype, archetype_index)` for every archetype
    /// matching `(include, exclude)`, in archetype-creation order.
    pub fn table_iter<'w>(
        &'w mut self,
        include: u64,
        exclude: u64,
    ) -> impl Iterator<Item = TableMatch<'w>> + 'w {
        let indices = self.matching_archetypes(include, exclude).to_vec();
        let archetypes = &self.archetypes;
        indices.into_iter().map(move |index| TableMatch {
            archetype: &archetypes[index as usize],
            index,
        })
    }

    pub fn for_each_table<F>(&mut self, include: u64, exclude: u64, mut f: F)
    where
        F: FnMut(&Archetype, u32),
    {
        for table in self.table_iter(include, exclude) {
            f(table.archetype, table.index);
        }
    }

    pub fn for_each_row<F>(&mut self, include: u64, exclude: u64, mut f: F)
    where
        F: FnMut(Entity, &Archetype, usize),
    {
        for table in self.table_iter(include, exclude) {
            for (row, &entity) in table.archetype.entities().iter().enumerate() {
                f(entity, table.archetype, row);
            }
        }
    }

    pub fn column<T: Component>(&self, archetype_index: u32) -> Option<&[T]> {
        query::column_checked::<T>(&self.archetypes[archetype_index as usize], &self.registry)
    }

    pub fn column_mut<T: Component>(&mut self, archetype_index: u32) -> Option<&mut [T]> {
        query::column_checked_mut::<T>(&mut self.archetypes[archetype_index as usize], &self.registry)
    }

    pub fn column_with_bit<T: Component>(&self, archetype_index: u32, bit: u64) -> Option<&[T]> {
        query::column_with_bit::<T>(&self.archetypes[archetype_index as usize], bit)
    }

    /// # Safety
    /// See [`query::column_unchecked`].
    pub unsafe fn column_unchecked<T: Component>(&self, archetype_index: u32, bit: u64) -> &[T] {
        query::column_unchecked::<T>(&self.archetypes[archetype_index as usize], bit)
    }

    // ---------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------

    pub fn send<E: 'static + Send + Sync>(&mut self, name: &str, value: E) -> Result<()> {
        self.events.send(name, value)
    }

    pub fn event_slice<E: 'static + Send + Sync>(&self, name: &str) -> Option<&[E]> {
        self.events.event_slice(name)
    }

    pub fn clear_events(&mut self, name: &str) {
        self.events.clear(name);
    }

    pub fn clear_all_events(&mut self) {
        self.events.clear_all();
    }
}

/// Borrow two distinct elements of `archetypes` mutably at once, in
/// `(source, destination)` order regardless of which index is larger.
///
/// # Panics
/// Panics (via slice indexing) if `a == b` — callers never migrate a row
/// to its own archetype, since add/remove always change the mask.
fn borrow_two_mut(archetypes: &mut [Archetype], a: usize, b: usize) -> (&mut Archetype, &mut Archetype) {
    assert_ne!(a, b, "cannot migrate a row to its own archetype");
    if a < b {
        let (left, right) = archetypes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = archetypes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistryBuilder;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(u32);

    fn test_registry() -> TypeRegistry {
        TypeRegistryBuilder::new()
            .register::<Position>()
            .register::<Velocity>()
            .register::<Health>()
            .build()
    }

    #[test]
    fn basic_lifecycle() {
        let mut world: World<()> = World::new(test_registry(), ());
        let e = world
            .spawn((Position { x: 1.0, y: 2.0 }, Velocity { x: 3.0, y: 4.0 }))
            .unwrap();
        assert_eq!(e, Entity { id: 0, generation: 0 });

        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Health>(e), None);

        assert!(world.set(e, Position { x: 10.0, y: 20.0 }));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 10.0, y: 20.0 }));

        assert!(world.despawn(e));
        assert!(!world.is_alive(e));

        let e2 = world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { x: 0.0, y: 0.0 })).unwrap();
        assert_eq!(e2, Entity { id: 0, generation: 1 });
    }

    #[test]
    fn swap_remove_integrity() {
        let mut world: World<()> = World::new(test_registry(), ());
        let e1 = world.spawn((Position { x: 1.0, y: 0.0 },)).unwrap();
        let e2 = world.spawn((Position { x: 2.0, y: 0.0 },)).unwrap();
        let e3 = world.spawn((Position { x: 3.0, y: 0.0 },)).unwrap();

        assert!(world.despawn(e2));

        assert_eq!(world.get::<Position>(e1).unwrap().x, 1.0);
        assert_eq!(world.get::<Position>(e3).unwrap().x, 3.0);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn structural_mutation_add_then_remove_round_trips() {
        let mut world: World<()> = World::new(test_registry(), ());
        let e = world.spawn((Position { x: 1.0, y: 1.0 },)).unwrap();
        let original_mask = world.component_mask(e).unwrap();

        assert!(world.add(e, Velocity { x: 5.0, y: 5.0 }).unwrap());
        assert_eq!(world.get::<Velocity>(e), Some(&Velocity { x: 5.0, y: 5.0 }));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));

        assert!(world.remove::<Velocity>(e).unwrap());
        assert_eq!(world.component_mask(e), Some(original_mask));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn removing_last_component_despawns_entity() {
        let mut world: World<()> = World::new(test_registry(), ());
        let e = world.spawn((Position { x: 1.0, y: 1.0 },)).unwrap();
        assert!(world.remove::<Position>(e).unwrap());
        assert!(!world.is_alive(e));
    }

    #[test]
    fn query_with_exclude() {
        let mut world: World<()> = World::new(test_registry(), ());
        let with_velocity = world
            .spawn((Position { x: 1.0, y: 0.0 }, Velocity { x: 0.0, y: 0.0 }))
            .unwrap();
        let without_velocity = world.spawn((Position { x: 2.0, y: 0.0 },)).unwrap();

        let position_bit = world.registry().bit::<Position>().unwrap();
        let velocity_bit = world.registry().bit::<Velocity>().unwrap();

        let matches = world.entities(position_bit, velocity_bit);
        assert_eq!(matches, vec![without_velocity]);
        assert!(!matches.contains(&with_velocity));
    }

    #[test]
    fn batch_spawn_yields_requested_count() {
        let mut world: World<()> = World::new(test_registry(), ());
        let entities = world
            .spawn_batch(1000, Position { x: 0.0, y: 0.0 })
            .unwrap();
        assert_eq!(entities.len(), 1000);
        assert_eq!(world.entity_count(), 1000);
        for e in entities {
            assert_eq!(world.get::<Position>(e), Some(&Position { x: 0.0, y: 0.0 }));
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct EnemyDied {
        id: u32,
        reward: u32,
    }

    #[test]
    fn deferred_despawn_and_events() {
        let mut world: World<()> = World::new(test_registry(), ());
        let e1 = world.spawn((Position { x: 0.0, y: 0.0 },)).unwrap();
        let _e2 = world.spawn((Position { x: 1.0, y: 0.0 },)).unwrap();

        world.queue_despawn(e1);
        world
            .send("enemy_died", EnemyDied { id: e1.id, reward: 10 })
            .unwrap();
        world.apply_despawns();

        assert!(!world.is_alive(e1));
        assert_eq!(world.event_slice::<EnemyDied>("enemy_died").unwrap().len(), 1);

        world.clear_events("enemy_died");
        assert_eq!(world.event_slice::<EnemyDied>("enemy_died").unwrap().len(), 0);
    }

    #[test]
    fn spawn_with_mask_zero_fills_then_batch_with_init_overwrites() {
        let mut world: World<()> = World::new(test_registry(), ());
        let mask = world.registry().bit::<Health>().unwrap();
        let entities = world.spawn_batch_with_init(mask, 3, |archetype, row| {
            let column = archetype.column_mut(mask).unwrap();
            unsafe {
                std::ptr::write(column.row_ptr_mut(row) as *mut Health, Health(100));
            }
        }).unwrap();

        for e in entities {
            assert_eq!(world.get::<Health>(e), Some(&Health(100)));
        }
    }

    #[test]
    fn resources_are_accessible() {
        let mut world: World<u32> = World::new(test_registry(), 7);
        assert_eq!(*world.resources(), 7);
        *world.resources_mut() += 1;
        assert_eq!(*world.resources(), 8);
    }

    #[test]
    fn add_overwrite_of_existing_component_drops_old_value() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct Counted(Arc<AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let registry = TypeRegistryBuilder::new().register::<Counted>().build();
        let mut world: World<()> = World::new(registry, ());
        let drops = Arc::new(AtomicUsize::new(0));

        let e = world.spawn((Counted(drops.clone()),)).unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        // `add` on a component the entity already has overwrites in place;
        // the old value must be dropped exactly once, not leaked.
        assert!(world.add(e, Counted(drops.clone())).unwrap());
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        assert!(world.despawn(e));
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_archetype_is_never_created() {
        let world: World<()> = World::new(test_registry(), ());
        assert_eq!(world.archetype_count(), 0);
    }
}
