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

//! Archetype storage: one column-major table per distinct component mask.

use crate::entity::Entity;
use crate::error::Result;
use crate::registry::{ComponentInfo, MAX_COMPONENTS};

/// `-1` sentinel for "no column/edge at this bit" in the fixed-size arrays.
const NONE_INDEX: i32 = -1;

/// Type-erased, contiguous storage for one component type within one archetype.
pub struct Column {
    bytes: Vec<u8>,
    elem_size: usize,
    bit: u64,
    type_index: usize,
    drop_fn: Option<unsafe fn(*mut u8)>,
}

impl Column {
    fn new(info: ComponentInfo) -> Self {
        Self {
            bytes: Vec::new(),
            elem_size: info.size.max(1),
            bit: info.bit,
            type_index: info.index,
            drop_fn: info.drop_fn,
        }
    }

    pub fn bit(&self) -> u64 {
        self.bit
    }

    pub fn type_index(&self) -> usize {
        self.type_index
    }

    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.elem_size
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw pointer to the start of row `row`'s bytes. Row must already exist
    /// (callers append via `Archetype::append_row` first).
    pub fn row_ptr(&self, row: usize) -> *const u8 {
        unsafe { self.bytes.as_ptr().add(row * self.elem_size) }
    }

    pub fn row_ptr_mut(&mut self, row: usize) -> *mut u8 {
        unsafe { self.bytes.as_mut_ptr().add(row * self.elem_size) }
    }

    /// View this column as a typed slice of length `len()`.
    ///
    /// # Safety
    /// Caller must ensure `T`'s size matches this column's `elem_size` and
    /// that `T` is the type this column was registered for.
    pub unsafe fn as_slice<T>(&self) -> &[T] {
        std::slice::from_raw_parts(self.bytes.as_ptr() as *const T, self.len())
    }

    /// # Safety
    /// See [`Column::as_slice`].
    pub unsafe fn as_slice_mut<T>(&mut self) -> &mut [T] {
        let len = self.len();
        std::slice::from_raw_parts_mut(self.bytes.as_mut_ptr() as *mut T, len)
    }

    fn reserve(&mut self, additional_rows: usize) -> Result<()> {
        self.bytes
            .try_reserve(additional_rows * self.elem_size)
            .map_err(Into::into)
    }

    fn grow_by_one(&mut self) -> Result<usize> {
        let row = self.len();
        self.bytes.try_reserve(self.elem_size)?;
        self.bytes.resize(self.bytes.len() + self.elem_size, 0);
        Ok(row)
    }

    /// Drop the value at `row` in place, if this column's type needs dropping.
    fn drop_row(&mut self, row: usize) {
        if let Some(drop_fn) = self.drop_fn {
            let ptr = self.row_ptr_mut(row);
            unsafe { drop_fn(ptr) };
        }
    }

    /// Swap-remove row `row`: move the last row's bytes into `row`'s slot
    /// (dropping whatever was there first), then truncate by one row. If
    /// `row` is the last row, just drop and truncate.
    fn swap_remove(&mut self, row: usize) {
        let last = self.len() - 1;
        if row != last {
            self.drop_row(row);
            unsafe {
                let src = self.row_ptr(last);
                let dst = self.row_ptr_mut(row);
                std::ptr::copy_nonoverlapping(src, dst, self.elem_size);
            }
        } else {
            self.drop_row(row);
        }
        let new_len = self.bytes.len() - self.elem_size;
        self.bytes.truncate(new_len);
    }

    /// Swap-remove row `row` without running its destructor: used during
    /// structural mutation, where `row`'s bytes were already bit-copied into
    /// a destination archetype's column an instant earlier, so the value at
    /// `row` is logically moved-out, not discarded.
    fn swap_remove_moved(&mut self, row: usize) {
        let last = self.len() - 1;
        if row != last {
            unsafe {
                let src = self.row_ptr(last);
                let dst = self.row_ptr_mut(row);
                std::ptr::copy_nonoverlapping(src, dst, self.elem_size);
            }
        }
        let new_len = self.bytes.len() - self.elem_size;
        self.bytes.truncate(new_len);
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.drop_fn {
            let count = self.len();
            for row in 0..count {
                let ptr = self.row_ptr_mut(row);
                unsafe { drop_fn(ptr) };
            }
        }
    }
}

/// Column-major table for every entity sharing one exact component mask.
pub struct Archetype {
    mask: u64,
    entities: Vec<Entity>,
    columns: Vec<Column>,
    column_by_bit: [i32; MAX_COMPONENTS],
    pub(crate) add_edges: [i32; MAX_COMPONENTS],
    pub(crate) remove_edges: [i32; MAX_COMPONENTS],
}

impl Archetype {
    pub(crate) fn new(mask: u64, infos: &[ComponentInfo]) -> Self {
        let mut column_by_bit = [NONE_INDEX; MAX_COMPONENTS];
        let mut columns = Vec::with_capacity(infos.len());
        for info in infos {
            column_by_bit[info.index] = columns.len() as i32;
            columns.push(Column::new(*info));
        }
        Self {
            mask,
            entities: Vec::new(),
            columns,
            column_by_bit,
            add_edges: [NONE_INDEX; MAX_COMPONENTS],
            remove_edges: [NONE_INDEX; MAX_COMPONENTS],
        }
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn has(&self, bit: u64) -> bool {
        self.mask & bit == bit
    }

    pub fn has_all(&self, mask: u64) -> bool {
        self.mask & mask == mask
    }

    pub fn column_index_of_bit(&self, bit: u64) -> Option<usize> {
        let idx = bit.trailing_zeros() as usize;
        if idx >= MAX_COMPONENTS {
            return None;
        }
        let slot = self.column_by_bit[idx];
        (slot >= 0).then_some(slot as usize)
    }

    pub fn column(&self, bit: u64) -> Option<&Column> {
        self.column_index_of_bit(bit).map(|i| &self.columns[i])
    }

    pub fn column_mut(&mut self, bit: u64) -> Option<&mut Column> {
        self.column_index_of_bit(bit).map(|i| &mut self.columns[i])
    }

    pub fn column_at(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn column_at_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn add_edge(&self, bit_index: usize) -> Option<u32> {
        let edge = self.add_edges[bit_index];
        (edge >= 0).then_some(edge as u32)
    }

    pub(crate) fn set_add_edge(&mut self, bit_index: usize, target: u32) {
        self.add_edges[bit_index] = target as i32;
    }

    pub(crate) fn remove_edge(&self, bit_index: usize) -> Option<u32> {
        let edge = self.remove_edges[bit_index];
        (edge >= 0).then_some(edge as u32)
    }

    pub(crate) fn set_remove_edge(&mut self, bit_index: usize, target: u32) {
        self.remove_edges[bit_index] = target as i32;
    }

    /// Reserve room for `additional` more rows across the entity vector and
    /// every column, to avoid per-row reallocation in batch spawns.
    pub(crate) fn reserve_rows(&mut self, additional: usize) -> Result<()> {
        self.entities.try_reserve(additional)?;
        for column in &mut self.columns {
            column.reserve(additional)?;
        }
        Ok(())
    }

    /// Append a new row for `entity`. Grows every column by one element;
    /// caller is responsible for writing each column's new cell. Returns the
    /// new row index.
    pub(crate) fn append_row(&mut self, entity: Entity) -> Result<usize> {
        self.entities.try_reserve(1)?;
        let row = self.entities.len();
        for column in &mut self.columns {
            let grown_row = column.grow_by_one()?;
            debug_assert_eq!(grown_row, row);
        }
        self.entities.push(entity);
        Ok(row)
    }

    /// Swap-remove row `row`. Returns the entity that was moved into `row`
    /// from the end, if any (the caller must then fix up that entity's
    /// directory row).
    pub(crate) fn swap_remove_row(&mut self, row: usize) -> Option<Entity> {
        let last = self.entities.len() - 1;
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        self.entities.swap_remove(row);
        if row < self.entities.len() {
            debug_assert_eq!(last, self.entities.len());
            Some(self.entities[row])
        } else {
            None
        }
    }

    /// Swap-remove row `row` as part of a structural-mutation migration.
    /// Columns whose bit is set in `moved_mask` were already bit-copied into
    /// the destination archetype and are truncated without running their
    /// destructor; columns outside `moved_mask` are genuinely discarded (e.g.
    /// the component `remove` is dropping) and are dropped as usual.
    pub(crate) fn swap_remove_row_for_migration(
        &mut self,
        row: usize,
        moved_mask: u64,
    ) -> Option<Entity> {
        let last = self.entities.len() - 1;
        for column in &mut self.columns {
            if column.bit() & moved_mask != 0 {
                column.swap_remove_moved(row);
            } else {
                column.swap_remove(row);
            }
        }
        self.entities.swap_remove(row);
        if row < self.entities.len() {
            debug_assert_eq!(last, self.entities.len());
            Some(self.entities[row])
        } else {
            None
        }
    }
}
