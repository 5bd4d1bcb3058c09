//! Growable storage with stable indices, built from a list of [`Slab`]s.
//!
//! # Layout
//!
//! A [`Colony`] never moves a value once it is stored. It grows by appending a new slab
//! instead of reallocating, and addresses a value by its global index:
//!
//! ```text
//! index = slab_index * slab_size + local_position
//!
//! slab 0: [ 0 .. 31 ]   slab 1: [ 32 .. 63 ]   slab 2: [ 64 .. 95 ]
//! ```
//!
//! A global occupancy bitmap mirrors the slabs so membership tests and ordered iteration
//! never touch the slot buffers. Fully empty slabs are kept for reuse.
//!
//! Insertion is first-fit: the lowest slab with a free slot wins, so freed slots in early
//! slabs are refilled before capacity grows.

use std::{marker::PhantomData, ptr::NonNull};

use fixedbitset::FixedBitSet;

use super::slab::Slab;
use crate::ecs::error::{Error, Result};

const BLOCK_BITS: usize = usize::BITS as usize;

/// A growable container of values with stable indices.
pub struct Colony<T> {
    slab_size: usize,
    slabs: Vec<Slab<T>>,

    /// One bit per slot across every slab; set iff the slot is occupied.
    occupied: FixedBitSet,

    len: usize,
}

impl<T> Default for Colony<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Colony<T> {
    /// Default number of slots per slab.
    pub const DEFAULT_SLAB_SIZE: usize = 32;

    /// Create an empty colony with [`DEFAULT_SLAB_SIZE`](Self::DEFAULT_SLAB_SIZE) slots per slab.
    pub fn new() -> Self {
        Self::with_slab_size(Self::DEFAULT_SLAB_SIZE)
    }

    /// Create an empty colony with `slab_size` slots per slab.
    ///
    /// # Panics
    /// - if `slab_size` is zero
    pub fn with_slab_size(slab_size: usize) -> Self {
        assert!(slab_size > 0, "slab size must be at least 1");
        Self {
            slab_size,
            slabs: Vec::new(),
            occupied: FixedBitSet::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn slab_size(&self) -> usize {
        self.slab_size
    }

    /// Get the number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the total number of slots across all slabs.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slabs.len() * self.slab_size
    }

    /// Get the number of allocated slabs.
    #[inline]
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Returns true if `index` refers to a live value.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.occupied.contains(index)
    }

    /// Insert a value, returning its stable index.
    pub fn insert(&mut self, value: T) -> usize {
        let slab_index = self.slab_with_space();
        let local = self.slabs[slab_index].push(value);
        self.commit(slab_index, local)
    }

    /// Construct a value in the next free slot, returning its stable index.
    ///
    /// Any needed slab is allocated before `f` runs, so the value is built where it will live.
    pub fn emplace_with(&mut self, f: impl FnOnce() -> T) -> usize {
        let slab_index = self.slab_with_space();
        let local = self.slabs[slab_index].push(f());
        self.commit(slab_index, local)
    }

    /// Remove and return the value at `index`.
    ///
    /// Erasing an index that is not occupied is a no-op and returns `None`.
    pub fn erase(&mut self, index: usize) -> Option<T> {
        if !self.contains(index) {
            return None;
        }
        let (slab_index, local) = self.split(index);
        let value = self.slabs[slab_index].remove(local).ok();
        debug_assert!(value.is_some(), "bitmap and slab disagree at {index}");

        self.occupied.set(index, false);
        self.len -= 1;
        value
    }

    /// Get a reference to the value at `index`.
    pub fn at(&self, index: usize) -> Result<&T> {
        if !self.contains(index) {
            return Err(Error::InvalidIndex { index });
        }
        let (slab_index, local) = self.split(index);
        self.slabs[slab_index]
            .at(local)
            .map_err(|_| Error::InvalidIndex { index })
    }

    /// Get a mutable reference to the value at `index`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        if !self.contains(index) {
            return Err(Error::InvalidIndex { index });
        }
        let (slab_index, local) = self.split(index);
        self.slabs[slab_index]
            .at_mut(local)
            .map_err(|_| Error::InvalidIndex { index })
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.at(index).ok()
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.at_mut(index).ok()
    }

    /// Get a raw pointer to the value at `index`.
    ///
    /// Slabs own separate allocations, so pointers to distinct indices never alias and stay
    /// valid until the value is erased, even if the colony grows.
    #[inline]
    pub(crate) fn slot_ptr(&self, index: usize) -> Option<NonNull<T>> {
        if !self.contains(index) {
            return None;
        }
        let (slab_index, local) = self.split(index);
        self.slabs[slab_index].slot_ptr(local)
    }

    /// Find the first occupied index at or after `from`.
    ///
    /// Scans the occupancy bitmap a block at a time.
    pub fn next_occupied(&self, from: usize) -> Option<usize> {
        if from >= self.capacity() {
            return None;
        }
        let blocks = self.occupied.as_slice();
        let mut block = from / BLOCK_BITS;
        let mut bits = *blocks.get(block)? & (usize::MAX << (from % BLOCK_BITS));
        loop {
            if bits != 0 {
                let index = block * BLOCK_BITS + bits.trailing_zeros() as usize;
                return (index < self.capacity()).then_some(index);
            }
            block += 1;
            bits = *blocks.get(block)?;
        }
    }

    /// Iterate over occupied indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.occupied.ones()
    }

    /// Iterate over values in ascending index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            colony: self,
            cursor: 0,
            remaining: self.len,
        }
    }

    /// Iterate mutably over values in ascending index order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            remaining: self.len,
            colony: NonNull::from(self),
            cursor: 0,
            _marker: PhantomData,
        }
    }

    /// Iterate over `(index, &value)` in ascending index order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        let slab_size = self.slab_size;
        self.slabs.iter().enumerate().flat_map(move |(slab_index, slab)| {
            slab.iter()
                .map(move |(local, value)| (slab_index * slab_size + local, value))
        })
    }

    /// Iterate over `(index, &mut value)` in ascending index order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        let slab_size = self.slab_size;
        self.slabs
            .iter_mut()
            .enumerate()
            .flat_map(move |(slab_index, slab)| {
                slab.iter_mut()
                    .map(move |(local, value)| (slab_index * slab_size + local, value))
            })
    }

    /// Erase every value for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        let doomed: Vec<usize> = self
            .entries_mut()
            .filter_map(|(index, value)| (!keep(value)).then_some(index))
            .collect();
        for index in doomed {
            self.erase(index);
        }
    }

    /// Drop every value. Slabs are kept for reuse.
    pub fn clear(&mut self) {
        for slab in &mut self.slabs {
            slab.clear();
        }
        self.occupied.clear();
        self.len = 0;
    }

    /// Pick the lowest slab with a free slot, appending a new one if none has space.
    fn slab_with_space(&mut self) -> usize {
        if self.len < self.capacity() {
            if let Some(slab_index) = self.slabs.iter().position(Slab::has_space) {
                return slab_index;
            }
        }
        self.slabs.push(Slab::new(self.slab_size));
        self.occupied.grow(self.capacity());
        self.slabs.len() - 1
    }

    /// Record a freshly pushed value in the bitmap.
    #[inline]
    fn commit(&mut self, slab_index: usize, local: usize) -> usize {
        let index = slab_index * self.slab_size + local;
        self.occupied.insert(index);
        self.len += 1;
        index
    }

    #[inline]
    fn split(&self, index: usize) -> (usize, usize) {
        (index / self.slab_size, index % self.slab_size)
    }
}

impl<T> std::fmt::Debug for Colony<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Colony")
            .field("slab_size", &self.slab_size)
            .field("slabs", &self.slabs.len())
            .field("len", &self.len)
            .finish()
    }
}

/// Iterator over the values of a [`Colony`], driven by [`Colony::next_occupied`].
pub struct Iter<'a, T> {
    colony: &'a Colony<T>,
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.colony.next_occupied(self.cursor)?;
        self.cursor = index + 1;
        self.remaining -= 1;
        self.colony.get(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable iterator over the values of a [`Colony`].
pub struct IterMut<'a, T> {
    colony: NonNull<Colony<T>>,
    cursor: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the colony is borrowed mutably for 'a and only read here. Values live in
        // slab buffers, outside the colony itself.
        let colony = unsafe { self.colony.as_ref() };
        let index = colony.next_occupied(self.cursor)?;
        self.cursor = index + 1;
        self.remaining -= 1;
        // SAFETY: each index is yielded once, so the returned borrows never overlap.
        colony
            .slot_ptr(index)
            .map(|value| unsafe { &mut *value.as_ptr() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<'a, T> IntoIterator for &'a Colony<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Colony<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
