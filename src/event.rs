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

//! Named, typed, poll-based event queues.
//!
//! Each name is bound to whatever event type it was first `send` with,
//! stored behind an object-safe `ErasedQueue` trait so `clear_all` can reset
//! every queue without knowing any of their concrete element types.

use std::any::Any;
use std::collections::HashMap;

use crate::error::Result;

/// Object-safe handle to a `Vec<E>` that lets `clear_all` truncate every
/// queue without knowing each entry's concrete `E`.
trait ErasedQueue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clear(&mut self);
}

impl<E: 'static + Send + Sync> ErasedQueue for Vec<E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clear(&mut self) {
        Vec::clear(self)
    }
}

/// Map of event-queue name to its (type-erased) FIFO buffer.
#[derive(Default)]
pub struct EventQueues {
    queues: HashMap<String, Box<dyn ErasedQueue>>,
}

impl EventQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the queue named `name`, creating it (bound to `E`)
    /// on first use.
    pub fn send<E: 'static + Send + Sync>(&mut self, name: &str, value: E) -> Result<()> {
        if let Some(boxed) = self.queues.get_mut(name) {
            if let Some(queue) = boxed.as_any_mut().downcast_mut::<Vec<E>>() {
                queue.try_reserve(1)?;
                queue.push(value);
                return Ok(());
            }
            // Name reused with a different event type: replace the queue.
            *boxed = Box::new(vec![value]);
            return Ok(());
        }
        self.queues.insert(name.to_string(), Box::new(vec![value]));
        Ok(())
    }

    /// Current contents of queue `name`, typed as `&[E]`.
    ///
    /// `None` if `name` has never been sent to, or was last sent a different
    /// event type.
    pub fn event_slice<E: 'static + Send + Sync>(&self, name: &str) -> Option<&[E]> {
        self.queues
            .get(name)
            .and_then(|boxed| boxed.as_any().downcast_ref::<Vec<E>>())
            .map(Vec::as_slice)
    }

    /// Truncate queue `name` to empty. A no-op if the name was never used.
    pub fn clear(&mut self, name: &str) {
        if let Some(boxed) = self.queues.get_mut(name) {
            boxed.clear();
        }
    }

    /// Truncate every queue, preserving each name's bound event type.
    pub fn clear_all(&mut self) {
        for boxed in self.queues.values_mut() {
            boxed.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct EnemyDied {
        id: u32,
        reward: u32,
    }

    #[test]
    fn send_then_read_slice() {
        let mut events = EventQueues::new();
        events
            .send("enemy_died", EnemyDied { id: 1, reward: 10 })
            .unwrap();
        let slice = events.event_slice::<EnemyDied>("enemy_died").unwrap();
        assert_eq!(slice, &[EnemyDied { id: 1, reward: 10 }]);
    }

    #[test]
    fn clear_empties_without_forgetting_type() {
        let mut events = EventQueues::new();
        events.send("enemy_died", 1u32).unwrap();
        events.clear("enemy_died");
        assert_eq!(events.event_slice::<u32>("enemy_died"), Some(&[][..]));
    }

    #[test]
    fn clear_all_empties_every_queue() {
        let mut events = EventQueues::new();
        events.send("a", 1u32).unwrap();
        events.send("b", "hi").unwrap();
        events.clear_all();
        assert_eq!(events.event_slice::<u32>("a"), None);
        assert_eq!(events.event_slice::<&str>("b"), None);
    }

    #[test]
    fn unused_name_is_none() {
        let events = EventQueues::new();
        assert_eq!(events.event_slice::<u32>("nope"), None);
    }
}
