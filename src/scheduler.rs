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

//! Sequential system execution.
//!
//! `Scheduler` holds a boxed-closure-per-system list and runs them in
//! registration order, short-circuiting on the first system that errors
//! rather than sorting systems into parallel stages from a conflict graph.

use crate::error::{EcsError, Result};
use crate::world::World;

/// One system: a closure over `&mut World<R>` returning `Result<()>`.
pub type BoxedSystem<R> = Box<dyn FnMut(&mut World<R>) -> Result<()> + Send + Sync>;

/// Ordered list of systems run in sequence against a `World<R>`.
pub struct Scheduler<R> {
    systems: Vec<BoxedSystem<R>>,
}

impl<R> Default for Scheduler<R> {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
        }
    }
}

impl<R> Scheduler<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system to the end of the run order.
    pub fn add_system<F>(&mut self, system: F)
    where
        F: FnMut(&mut World<R>) -> Result<()> + Send + Sync + 'static,
    {
        self.systems.push(Box::new(system));
    }

    pub fn with_system<F>(mut self, system: F) -> Self
    where
        F: FnMut(&mut World<R>) -> Result<()> + Send + Sync + 'static,
    {
        self.add_system(system);
        self
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run every system once, in order. Stops at (and returns) the first
    /// system to return `Err`, wrapped with its position in the run order.
    pub fn run(&mut self, world: &mut World<R>) -> Result<()> {
        for (index, system) in self.systems.iter_mut().enumerate() {
            if let Err(err) = system(world) {
                return Err(EcsError::System(index, Box::new(err)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistryBuilder;

    #[test]
    fn runs_systems_in_order() {
        let registry = TypeRegistryBuilder::new().build();
        let mut world: World<()> = World::new(registry, ());
        let mut scheduler = Scheduler::new();
        scheduler.add_system(|_w: &mut World<()>| Ok(()));
        scheduler.add_system(|_w: &mut World<()>| Ok(()));
        assert_eq!(scheduler.system_count(), 2);
        assert!(scheduler.run(&mut world).is_ok());
    }

    #[test]
    fn short_circuits_on_first_error() {
        let registry = TypeRegistryBuilder::new().build();
        let mut world: World<()> = World::new(registry, ());
        let mut scheduler = Scheduler::new();
        let mut second_ran = false;
        scheduler.add_system(|_w: &mut World<()>| Err(EcsError::AllocationFailed));
        scheduler.add_system(move |_w: &mut World<()>| {
            second_ran = true;
            Ok(())
        });
        let err = scheduler.run(&mut world).unwrap_err();
        match err {
            EcsError::System(index, _) => assert_eq!(index, 0),
            other => panic!("expected System error, got {other:?}"),
        }
    }
}
