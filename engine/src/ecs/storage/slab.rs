//! Fixed-capacity slot storage with an embedded free list.
//!
//! A [`Slab`] owns one contiguous buffer of `capacity` slots that is allocated once and never
//! resized, so the address of a value stays put from insertion until it is removed.
//!
//! Free slots are chained through a side array of "next free" indices rather than through the
//! slots themselves, which keeps the value type unconstrained (zero-sized types included)
//! while allocate and free stay O(1):
//!
//! ```text
//! slots:     [ A ][ . ][ B ][ . ][ . ]
//! next:        -    3    -    4   NONE
//! free_head: 1
//! ```
//!
//! Reuse is LIFO: the most recently freed slot is the next one handed out.

use std::{
    marker::PhantomData,
    mem::MaybeUninit,
    ptr::{self, NonNull},
};

use fixedbitset::FixedBitSet;

use crate::ecs::error::{Error, Result};

/// Marks the end of the free list.
const NONE: usize = usize::MAX;

/// A fixed-capacity block of storage slots.
pub struct Slab<T> {
    /// Slot buffer, obtained from `Box<[MaybeUninit<T>]>` and owned by this slab.
    buffer: NonNull<MaybeUninit<T>>,

    /// The number of slots in `buffer`.
    capacity: usize,

    /// For each free slot, the next free slot (or `NONE`). Meaningless for occupied slots.
    next: Box<[usize]>,

    /// Head of the free list.
    free_head: usize,

    /// Which slots hold a live value.
    occupied: FixedBitSet,

    /// The number of live values.
    len: usize,

    _marker: PhantomData<T>,
}

// SAFETY: a slab owns its values exactly like a `Box<[T]>` would.
unsafe impl<T: Send> Send for Slab<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for Slab<T> {}

impl<T> Slab<T> {
    /// Create an empty slab with room for `capacity` values.
    ///
    /// # Panics
    /// - if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "slab capacity must be at least 1");

        let mut buffer: Vec<MaybeUninit<T>> = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, MaybeUninit::uninit);
        let buffer = Box::into_raw(buffer.into_boxed_slice());

        Self {
            // SAFETY: `Box::into_raw` never returns null.
            buffer: unsafe { NonNull::new_unchecked(buffer.cast::<MaybeUninit<T>>()) },
            capacity,
            next: Self::fresh_links(capacity),
            free_head: 0,
            occupied: FixedBitSet::with_capacity(capacity),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Build the free list `0 -> 1 -> .. -> capacity - 1 -> NONE`.
    fn fresh_links(capacity: usize) -> Box<[usize]> {
        (1..capacity).chain(std::iter::once(NONE)).collect()
    }

    /// Get the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
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

    /// Returns true if at least one slot is free.
    #[inline]
    pub fn has_space(&self) -> bool {
        self.free_head != NONE
    }

    /// Get the number of free slots.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Returns true if the slot at `position` holds a live value.
    #[inline]
    pub fn contains(&self, position: usize) -> bool {
        self.occupied.contains(position)
    }

    /// Insert a value, returning its position.
    ///
    /// Fails with [`Error::CapacityExceeded`] if no slot is free.
    pub fn insert(&mut self, value: T) -> Result<usize> {
        if !self.has_space() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(self.push(value))
    }

    /// Construct a value in the next free slot, returning its position.
    ///
    /// `f` is only called if a slot is available.
    pub fn insert_with(&mut self, f: impl FnOnce() -> T) -> Result<usize> {
        if !self.has_space() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(self.push(f()))
    }

    /// Pop the head of the free list and write `value` there.
    ///
    /// The caller must have checked [`has_space`](Self::has_space).
    pub(super) fn push(&mut self, value: T) -> usize {
        debug_assert!(self.has_space(), "push into a full slab");

        let position = self.free_head;
        self.free_head = self.next[position];

        // SAFETY: position < capacity since it came off the free list, and the slot is vacant.
        unsafe { self.slot(position).write(value) };

        self.occupied.insert(position);
        self.len += 1;
        position
    }

    /// Remove and return the value at `position`, pushing the slot onto the free list.
    ///
    /// Fails with [`Error::OutOfRange`] if `position >= capacity`, or [`Error::InvalidIndex`]
    /// if the slot is already free.
    pub fn remove(&mut self, position: usize) -> Result<T> {
        self.check(position)?;

        // SAFETY: the slot is occupied, and is marked free below so it is never read again.
        let value = unsafe { ptr::read(self.slot(position)) };

        self.occupied.set(position, false);
        self.next[position] = self.free_head;
        self.free_head = position;
        self.len -= 1;
        Ok(value)
    }

    /// Get a reference to the value at `position`.
    pub fn at(&self, position: usize) -> Result<&T> {
        self.check(position)?;
        // SAFETY: checked occupied.
        Ok(unsafe { &*self.slot(position) })
    }

    /// Get a mutable reference to the value at `position`.
    pub fn at_mut(&mut self, position: usize) -> Result<&mut T> {
        self.check(position)?;
        // SAFETY: checked occupied, and `&mut self` guarantees exclusivity.
        Ok(unsafe { &mut *self.slot(position) })
    }

    /// Get a raw pointer to an occupied slot.
    ///
    /// The pointer carries the buffer's own provenance, so it may be written through while
    /// other slots of this slab are borrowed.
    #[inline]
    pub(crate) fn slot_ptr(&self, position: usize) -> Option<NonNull<T>> {
        if self.contains(position) {
            // SAFETY: occupied positions are in bounds.
            Some(unsafe { NonNull::new_unchecked(self.slot(position)) })
        } else {
            None
        }
    }

    /// Drop every live value and reset the slab to empty, keeping the buffer.
    pub fn clear(&mut self) {
        debug_assert_eq!(self.free_list_len(), self.remaining());

        // Reset first so a panicking destructor cannot lead to a double drop.
        let occupied = std::mem::replace(
            &mut self.occupied,
            FixedBitSet::with_capacity(self.capacity),
        );
        self.next = Self::fresh_links(self.capacity);
        self.free_head = 0;
        self.len = 0;

        for position in occupied.ones() {
            // SAFETY: the slot was occupied and is no longer tracked.
            unsafe { ptr::drop_in_place(self.slot(position)) };
        }
    }

    /// Iterate over `(position, &value)` in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.occupied.ones().map(move |position| {
            // SAFETY: `ones` only yields occupied positions.
            (position, unsafe { &*self.slot(position) })
        })
    }

    /// Iterate over `(position, &mut value)` in ascending position order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        let buffer = self.buffer;
        self.occupied.ones().map(move |position| {
            // SAFETY: `ones` yields each occupied position once, so the borrows are disjoint.
            (position, unsafe {
                &mut *buffer.as_ptr().add(position).cast::<T>()
            })
        })
    }

    /// Validate that `position` is in range and occupied.
    #[inline]
    fn check(&self, position: usize) -> Result<()> {
        if position >= self.capacity {
            return Err(Error::OutOfRange {
                position,
                capacity: self.capacity,
            });
        }
        if !self.contains(position) {
            return Err(Error::InvalidIndex { index: position });
        }
        Ok(())
    }

    /// Pointer to the slot at `position`.
    ///
    /// # Safety
    /// - `position < capacity`
    #[inline]
    unsafe fn slot(&self, position: usize) -> *mut T {
        debug_assert!(position < self.capacity);
        unsafe { self.buffer.as_ptr().add(position).cast::<T>() }
    }

    /// Walk the free list, counting its nodes.
    fn free_list_len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        while cursor != NONE {
            count += 1;
            cursor = self.next[cursor];
        }
        count
    }
}

impl<T> Drop for Slab<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the buffer came from `Box::into_raw` with exactly `capacity` elements, and
        // `MaybeUninit` never drops its contents.
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                self.buffer.as_ptr(),
                self.capacity,
            )));
        }
    }
}

impl<T> std::fmt::Debug for Slab<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slab")
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .finish()
    }
}
