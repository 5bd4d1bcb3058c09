//! Entity handles for the ECS.
//!
//! An [`Entity`] is an opaque integer handle. Handles are handed out by an [`Allocator`] in
//! strictly increasing order and are never reused for the lifetime of the allocator, so a
//! destroyed entity's handle can never alias a newer entity.
//!
//! ```rust,ignore
//! let mut allocator = Allocator::new();
//! let a = allocator.alloc(); // Entity(1)
//! let b = allocator.alloc(); // Entity(2)
//! assert!(a < b);
//! ```

mod info;

use std::fmt;

pub use info::EntityInfo;

/// An entity in the ECS.
///
/// Ordering follows allocation order, which is also creation order within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u64);

impl Entity {
    /// Construct an entity from a raw handle value.
    ///
    /// This is primarily useful for tests and for handles round-tripped through external code.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monotonic allocator of entity handles.
///
/// The first handle is `1`; `0` is never produced.
#[derive(Debug)]
pub struct Allocator {
    /// Next handle to give out.
    next: u64,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// Construct a new allocator starting from handle 1.
    #[inline]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next entity handle.
    #[inline]
    pub fn alloc(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }

    /// The number of handles allocated so far.
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_monotonic() {
        // Given
        let mut allocator = Allocator::new();

        // When
        let handles: Vec<_> = (0..100).map(|_| allocator.alloc()).collect();

        // Then
        assert_eq!(handles[0], Entity::from_raw(1));
        assert!(handles.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(allocator.allocated(), 100);
    }

    #[test]
    fn display_is_raw_value() {
        assert_eq!(Entity::from_raw(42).to_string(), "42");
    }
}
