//! DynamicArray: growable contiguous sequence with positional insert/remove,
//! linear or binary search, in-place sort, and a cleanup callback.

use crate::Cleanup;
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Index, IndexMut};
use log::debug;
use thiserror::Error;

/// Smallest capacity allocated on growth.
const MIN_GROWTH: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ArrayError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("search start {start} out of bounds for length {len}")]
    StartOutOfBounds { start: usize, len: usize },
}

/// Result of [`DynamicArray::search`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SearchOutcome {
    Found(usize),
    /// Linear search found no match.
    NotFound,
    /// Binary search found no match; inserting here keeps the order.
    InsertAt(usize),
}

impl SearchOutcome {
    pub fn index(self) -> Option<usize> {
        match self {
            SearchOutcome::Found(i) => Some(i),
            SearchOutcome::NotFound | SearchOutcome::InsertAt(_) => None,
        }
    }

    /// Integer encoding: the index when found, `-1` for a linear miss, and
    /// `-(insertion point) - 1` for a binary miss.
    pub fn code(self) -> isize {
        match self {
            SearchOutcome::Found(i) => i as isize,
            SearchOutcome::NotFound => -1,
            SearchOutcome::InsertAt(p) => -(p as isize) - 1,
        }
    }
}

pub struct DynamicArray<T> {
    elems: Vec<T>,
    cleanup: Option<Cleanup<T>>,
}

impl<T> DynamicArray<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Storage for `capacity_hint` elements is allocated up front; zero defers
    /// allocation to the first insert.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        debug!("dynamic array created with capacity {capacity_hint}");
        Self {
            elems: Vec::with_capacity(capacity_hint),
            cleanup: None,
        }
    }

    /// `cleanup` receives elements on `remove`, on overwrite by `replace`,
    /// and on `clear`/drop.
    pub fn with_cleanup<F>(capacity_hint: usize, cleanup: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        Self::with_capacity(capacity_hint).on_cleanup(cleanup)
    }

    pub fn on_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.elems.capacity()
    }

    /// Panics if `index >= len`.
    pub fn at(&self, index: usize) -> &T {
        match self.elems.get(index) {
            Some(e) => e,
            None => panic!("index {index} out of bounds for length {}", self.len()),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elems.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.elems.get_mut(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elems
    }

    /// Place `elem` at `index`, shifting `[index, len)` up one slot.
    /// `index == len` appends.
    pub fn insert(&mut self, index: usize, elem: T) -> Result<(), ArrayError> {
        let len = self.len();
        if index > len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        self.grow_if_full();
        self.elems.insert(index, elem);
        Ok(())
    }

    pub fn append(&mut self, elem: T) {
        self.grow_if_full();
        self.elems.push(elem);
    }

    /// Overwrite the element at `index`; the old element goes to cleanup.
    pub fn replace(&mut self, index: usize, elem: T) -> Result<(), ArrayError> {
        let slot = self.slot_mut(index)?;
        let old = core::mem::replace(slot, elem);
        self.release(old);
        Ok(())
    }

    /// Remove the element at `index`, shifting the tail down; the element
    /// goes to cleanup.
    pub fn remove(&mut self, index: usize) -> Result<(), ArrayError> {
        let old = self.take(index)?;
        self.release(old);
        Ok(())
    }

    /// Remove and return the element at `index` without running cleanup.
    pub fn take(&mut self, index: usize) -> Result<T, ArrayError> {
        let len = self.len();
        if index >= len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        Ok(self.elems.remove(index))
    }

    /// Search `[start, len)` for an element comparing `Equal` to `key`.
    ///
    /// With `sorted`, a binary search is used and the array must already be
    /// ordered by `cmp`; otherwise the result is unspecified. A binary miss
    /// reports the absolute insertion point.
    pub fn search<F>(
        &self,
        key: &T,
        mut cmp: F,
        start: usize,
        sorted: bool,
    ) -> Result<SearchOutcome, ArrayError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let len = self.len();
        if start > len {
            return Err(ArrayError::StartOutOfBounds { start, len });
        }
        let tail = &self.elems[start..];
        let outcome = if sorted {
            match tail.binary_search_by(|probe| cmp(probe, key)) {
                Ok(i) => SearchOutcome::Found(start + i),
                Err(p) => SearchOutcome::InsertAt(start + p),
            }
        } else {
            tail.iter()
                .position(|e| cmp(key, e) == Ordering::Equal)
                .map_or(SearchOutcome::NotFound, |i| SearchOutcome::Found(start + i))
        };
        Ok(outcome)
    }

    /// In-place unstable sort.
    pub fn sort<F>(&mut self, cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.elems.sort_unstable_by(cmp);
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.elems.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.elems.iter_mut()
    }

    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&T),
    {
        self.elems.iter().for_each(visit);
    }

    pub fn for_each_mut<F>(&mut self, visit: F)
    where
        F: FnMut(&mut T),
    {
        self.elems.iter_mut().for_each(visit);
    }

    /// Remove every element through cleanup; capacity is kept.
    pub fn clear(&mut self) {
        match self.cleanup.as_mut() {
            Some(cleanup) => self.elems.drain(..).for_each(|e| cleanup(e)),
            None => self.elems.clear(),
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.elems.len();
        self.elems
            .get_mut(index)
            .ok_or(ArrayError::IndexOutOfBounds { index, len })
    }

    fn grow_if_full(&mut self) {
        let cap = self.elems.capacity();
        if self.elems.len() == cap {
            let target = (cap * 2).max(MIN_GROWTH);
            self.elems.reserve_exact(target - cap);
        }
    }

    fn release(&mut self, elem: T) {
        if let Some(cleanup) = self.cleanup.as_mut() {
            cleanup(elem);
        }
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Index<usize> for DynamicArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<T> IndexMut<usize> for DynamicArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.elems.len();
        match self.elems.get_mut(index) {
            Some(e) => e,
            None => panic!("index {index} out of bounds for length {len}"),
        }
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for elem in iter {
            array.append(elem);
        }
        array
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.elems.iter()).finish()
    }
}
