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

//! Archetype-based Entity Component System.
//!
//! Entities are `(id, generation)` handles. Components live in column-major
//! archetype tables keyed by a 64-bit bitmask; structural mutation moves a
//! row between tables and memoises the transition as an edge on the source
//! archetype. Queries resolve a `(include, exclude)` mask pair against a
//! cache of matching archetype indices rather than scanning every table.

mod archetype;
mod bitset;
mod component;
mod entity;
mod error;
mod event;
mod query;
mod registry;
mod scheduler;
mod world;

pub mod prelude {
    pub use crate::archetype::{Archetype, Column};
    pub use crate::component::{Bundle, Component};
    pub use crate::entity::{Entity, EntityLocation};
    pub use crate::error::{EcsError, Result};
    pub use crate::event::EventQueues;
    pub use crate::query::TableMatch;
    pub use crate::registry::{TypeRegistry, TypeRegistryBuilder};
    pub use crate::scheduler::Scheduler;
    pub use crate::world::World;
}

pub use prelude::*;
