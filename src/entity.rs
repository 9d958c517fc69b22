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

//! Entity identifiers, location metadata, and the generational directory
//! that maps an id to its current archetype row.

use crate::error::Result;

/// Generational entity handle.
///
/// Two handles are equal iff both `id` and `generation` match. `Entity::NIL`
/// is never issued by [`World::spawn`](crate::world::World::spawn) except
/// when spawning an empty bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub id: u32,
    pub generation: u32,
}

impl Entity {
    /// The sentinel handle produced by spawning an empty component bundle.
    pub const NIL: Entity = Entity {
        id: 0,
        generation: 0,
    };

    pub fn is_nil(self) -> bool {
        self == Entity::NIL
    }
}

/// Where a live entity's row lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype_index: u32,
    pub row: u32,
    pub generation: u32,
    pub alive: bool,
}

impl EntityLocation {
    const DEAD: EntityLocation = EntityLocation {
        archetype_index: u32::MAX,
        row: u32::MAX,
        generation: 0,
        alive: false,
    };
}

const MIN_DIRECTORY_CAPACITY: usize = 64;

/// Generational id allocator plus the directory of where each live id lives.
///
/// Free ids are recycled through an explicit free-list with a generation
/// bump, rather than delegating the recycling strategy to a third-party
/// slot map, so the exact `(id, generation)` sequence is observable and
/// deterministic.
#[derive(Debug, Default)]
pub struct EntityDirectory {
    locations: Vec<EntityLocation>,
    free_list: Vec<Entity>,
    next_id: u32,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self {
            locations: Vec::new(),
            free_list: Vec::new(),
            next_id: 0,
        }
    }

    /// Allocate a fresh entity id, reusing a retired slot if one is queued.
    pub fn allocate(&mut self) -> Result<Entity> {
        if let Some(entity) = self.free_list.pop() {
            self.locations[entity.id as usize] = EntityLocation {
                archetype_index: u32::MAX,
                row: u32::MAX,
                generation: entity.generation,
                alive: true,
            };
            return Ok(entity);
        }

        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("entity id counter overflowed u32");

        if id as usize >= self.locations.len() {
            let target = (id as usize + 1).max(MIN_DIRECTORY_CAPACITY);
            let additional = target.saturating_sub(self.locations.len());
            self.locations.try_reserve(additional)?;
            self.locations.resize(target, EntityLocation::DEAD);
        }

        let entity = Entity { id, generation: 0 };
        self.locations[id as usize] = EntityLocation {
            archetype_index: u32::MAX,
            row: u32::MAX,
            generation: 0,
            alive: true,
        };
        Ok(entity)
    }

    /// Reserve room for `additional` more live entities, so a batch spawn's
    /// repeated `allocate` calls don't each risk a reallocation.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let target = self.locations.len() + additional;
        let extra = target.saturating_sub(self.locations.len());
        self.locations.try_reserve(extra)?;
        Ok(())
    }

    /// Validate a handle: in bounds, alive, and generation matches.
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.locations
            .get(entity.id as usize)
            .is_some_and(|loc| loc.alive && loc.generation == entity.generation)
    }

    pub fn location(&self, entity: Entity) -> Option<EntityLocation> {
        if self.is_valid(entity) {
            self.locations.get(entity.id as usize).copied()
        } else {
            None
        }
    }

    pub fn set_location(&mut self, entity: Entity, archetype_index: u32, row: u32) {
        let loc = &mut self.locations[entity.id as usize];
        loc.archetype_index = archetype_index;
        loc.row = row;
    }

    /// Update the row of whichever entity currently occupies `(archetype, row)`
    /// after a swap-remove moved it there. Looked up by id since callers only
    /// have the entity handle that was swapped in.
    pub fn set_row(&mut self, entity: Entity, row: u32) {
        if let Some(loc) = self.locations.get_mut(entity.id as usize) {
            loc.row = row;
        }
    }

    /// Retire a validated entity: mark dead, bump generation, queue for reuse.
    pub fn retire(&mut self, entity: Entity) {
        let loc = &mut self.locations[entity.id as usize];
        loc.alive = false;
        loc.generation = loc.generation.wrapping_add(1);
        self.free_list.push(Entity {
            id: entity.id,
            generation: loc.generation,
        });
    }

    pub fn len(&self) -> usize {
        self.locations.iter().filter(|l| l.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_assigns_sequential_ids() {
        let mut dir = EntityDirectory::new();
        let a = dir.allocate().unwrap();
        let b = dir.allocate().unwrap();
        assert_eq!(a, Entity { id: 0, generation: 0 });
        assert_eq!(b, Entity { id: 1, generation: 0 });
    }

    #[test]
    fn retire_then_reallocate_bumps_generation() {
        let mut dir = EntityDirectory::new();
        let a = dir.allocate().unwrap();
        dir.retire(a);
        assert!(!dir.is_valid(a));

        let reused = dir.allocate().unwrap();
        assert_eq!(reused.id, a.id);
        assert_eq!(reused.generation, a.generation + 1);
    }

    #[test]
    fn stale_handle_fails_validation_after_retire() {
        let mut dir = EntityDirectory::new();
        let a = dir.allocate().unwrap();
        dir.retire(a);
        let _ = dir.allocate().unwrap();
        assert!(!dir.is_valid(a));
    }
}
