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

//! Fixed component type registry.
//!
//! Built once via [`TypeRegistryBuilder`] and frozen into a [`TypeRegistry`]
//! before a [`World`](crate::world::World) is constructed. Every registered
//! type gets a stable index in `[0, N)` with `N <= 64` and a derived bit
//! `1 << index`; lookups from a `TypeId` to that bit/size/index are O(1) via
//! an `FxHashMap`.

use std::any::TypeId;
use std::mem;

use rustc_hash::FxHashMap;

use crate::component::Component;

/// Maximum number of distinct component types a single world may register.
pub const MAX_COMPONENTS: usize = 64;

#[derive(Clone, Copy)]
pub(crate) struct ComponentInfo {
    pub index: usize,
    pub bit: u64,
    pub size: usize,
    pub align: usize,
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

/// Accumulates component registrations in the order the caller wants them
/// indexed, then freezes into a [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    infos: Vec<ComponentInfo>,
    index_by_type: FxHashMap<TypeId, usize>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register component type `T`, assigning it the next free index.
    ///
    /// # Panics
    /// Panics if `T` is already registered, or if this would exceed
    /// [`MAX_COMPONENTS`] (`N <= 64` is a hard structural limit: masks are a
    /// single `u64`).
    pub fn register<T: Component>(mut self) -> Self {
        let type_id = TypeId::of::<T>();
        assert!(
            !self.index_by_type.contains_key(&type_id),
            "component type already registered"
        );
        let index = self.infos.len();
        assert!(
            index < MAX_COMPONENTS,
            "cannot register more than {MAX_COMPONENTS} component types"
        );

        let drop_fn: Option<unsafe fn(*mut u8)> = if mem::needs_drop::<T>() {
            Some(|ptr| unsafe { std::ptr::drop_in_place(ptr as *mut T) })
        } else {
            None
        };

        self.infos.push(ComponentInfo {
            index,
            bit: 1u64 << index,
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            drop_fn,
        });
        self.index_by_type.insert(type_id, index);
        self
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            infos: self.infos,
            index_by_type: self.index_by_type,
        }
    }
}

/// Frozen, ordered list of component types known to a [`World`](crate::world::World).
pub struct TypeRegistry {
    infos: Vec<ComponentInfo>,
    index_by_type: FxHashMap<TypeId, usize>,
}

impl TypeRegistry {
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub(crate) fn info_of(&self, type_id: TypeId) -> Option<ComponentInfo> {
        self.index_by_type.get(&type_id).map(|&i| self.infos[i])
    }

    pub(crate) fn info_at(&self, index: usize) -> ComponentInfo {
        self.infos[index]
    }

    pub(crate) fn infos(&self) -> &[ComponentInfo] {
        &self.infos
    }

    pub(crate) fn bit_of_type_id(&self, type_id: TypeId) -> Option<u64> {
        self.info_of(type_id).map(|i| i.bit)
    }

    /// Bit for a registered type, or `None` if `T` was never registered.
    pub fn bit<T: Component>(&self) -> Option<u64> {
        self.info_of(TypeId::of::<T>()).map(|i| i.bit)
    }

    /// Byte size of a registered type, or `None` if unregistered.
    pub fn size<T: Component>(&self) -> Option<usize> {
        self.info_of(TypeId::of::<T>()).map(|i| i.size)
    }

    /// Stable index of a registered type, or `None` if unregistered.
    pub fn index<T: Component>(&self) -> Option<usize> {
        self.info_of(TypeId::of::<T>()).map(|i| i.index)
    }

    /// Byte size of the component occupying bit `1 << index`.
    pub fn size_of_bit(&self, bit: u64) -> Option<usize> {
        let index = bit.trailing_zeros() as usize;
        self.infos
            .iter()
            .find(|i| i.index == index)
            .map(|i| i.size)
    }

    pub(crate) fn bit_of_or_panic<T: Component>(&self) -> u64 {
        self.bit::<T>()
            .unwrap_or_else(|| panic!("component type {} was never registered with this world's TypeRegistry", std::any::type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Position {
        #[allow(dead_code)]
        x: f32,
    }
    #[derive(Debug, Clone, Copy)]
    struct Velocity {
        #[allow(dead_code)]
        x: f32,
    }

    #[test]
    fn registration_order_determines_bits() {
        let registry = TypeRegistryBuilder::new()
            .register::<Position>()
            .register::<Velocity>()
            .build();

        assert_eq!(registry.index::<Position>(), Some(0));
        assert_eq!(registry.index::<Velocity>(), Some(1));
        assert_eq!(registry.bit::<Position>(), Some(1));
        assert_eq!(registry.bit::<Velocity>(), Some(2));
    }

    #[test]
    fn unregistered_type_returns_none() {
        let registry = TypeRegistryBuilder::new().register::<Position>().build();
        assert_eq!(registry.bit::<Velocity>(), None);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn double_registration_panics() {
        let _ = TypeRegistryBuilder::new()
            .register::<Position>()
            .register::<Position>();
    }
}
