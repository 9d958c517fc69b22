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

//! Component and Bundle traits
//!
//! Components are data attached to entities. Bundles group multiple
//! components for spawning in a single archetype transition.

use std::any::TypeId;

use smallvec::{smallvec, SmallVec};

use crate::registry::TypeRegistry;

/// Maximum number of components supported by `Bundle` implementations.
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Marker trait for components.
///
/// Components must be `'static` (no borrowed data) and plain data: the
/// registry only needs `size_of`/`align_of`/drop glue to store them, nothing
/// about their layout beyond that.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// A group of components spawned onto one entity at once.
///
/// Implemented for tuples of up to [`MAX_BUNDLE_COMPONENTS`] components;
/// `()` is the empty bundle that produces [`Entity::NIL`](crate::entity::Entity::NIL).
pub trait Bundle: Send + Sync + 'static {
    /// Type ids of all components in the bundle, in declaration order —
    /// this is also the order `write_components` expects its pointer slice.
    fn type_ids() -> SmallVec<[TypeId; MAX_BUNDLE_COMPONENTS]>
    where
        Self: Sized;

    /// OR of every component's registry bit.
    ///
    /// # Panics
    /// Panics if any component type in the bundle was never registered with
    /// `registry`.
    fn mask(registry: &TypeRegistry) -> u64
    where
        Self: Sized;

    /// Write components to raw pointers, one per `type_ids()` entry, in order.
    ///
    /// # Safety
    /// Caller must ensure pointers are valid, properly aligned, and point at
    /// memory of the correct component's size.
    unsafe fn write_components(self, ptrs: &[*mut u8]);
}

impl Bundle for () {
    fn type_ids() -> SmallVec<[TypeId; MAX_BUNDLE_COMPONENTS]> {
        SmallVec::new()
    }

    fn mask(_registry: &TypeRegistry) -> u64 {
        0
    }

    unsafe fn write_components(self, _ptrs: &[*mut u8]) {}
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            fn type_ids() -> SmallVec<[TypeId; MAX_BUNDLE_COMPONENTS]> {
                smallvec![$(TypeId::of::<$T>()),+]
            }

            fn mask(registry: &TypeRegistry) -> u64 {
                let mut mask = 0u64;
                $(mask |= registry.bit_of_or_panic::<$T>();)+
                mask
            }

            #[allow(non_snake_case)]
            unsafe fn write_components(self, ptrs: &[*mut u8]) {
                let ($($T,)+) = self;
                let mut i = 0;
                $(
                    std::ptr::write(ptrs[i] as *mut $T, $T);
                    i += 1;
                )+
                let _ = i;
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistryBuilder;

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
    fn single_component_type_ids() {
        let type_ids = <(Position,)>::type_ids();
        assert_eq!(type_ids.len(), 1);
        assert_eq!(type_ids[0], TypeId::of::<Position>());
    }

    #[test]
    fn multi_component_mask_ors_bits() {
        let registry = TypeRegistryBuilder::new()
            .register::<Position>()
            .register::<Velocity>()
            .build();
        let mask = <(Position, Velocity)>::mask(&registry);
        assert_eq!(mask, 0b11);
    }

    #[test]
    fn empty_bundle_has_zero_mask() {
        let registry = TypeRegistryBuilder::new().register::<Position>().build();
        assert_eq!(<()>::mask(&registry), 0);
        assert!(<()>::type_ids().is_empty());
    }
}
