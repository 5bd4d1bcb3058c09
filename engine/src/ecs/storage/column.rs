//! Type-erased access to the colony of one component type.

use std::any::Any;

use super::colony::Colony;
use crate::ecs::component::{Component, name_of};

/// The untyped face of a [`Colony`], used where the registry only knows a component's
/// [`TypeId`](crate::ecs::component::TypeId), e.g. while tearing an entity down.
pub trait Column: Any {
    /// Drop the value at `index`. Returns false if the index was not occupied.
    fn erase(&mut self, index: usize) -> bool;

    fn contains(&self, index: usize) -> bool;

    /// Get the number of live values.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every value.
    fn clear(&mut self);

    /// Get the readable name of the stored component type.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> Column for Colony<C> {
    #[inline]
    fn erase(&mut self, index: usize) -> bool {
        Colony::erase(self, index).is_some()
    }

    #[inline]
    fn contains(&self, index: usize) -> bool {
        Colony::contains(self, index)
    }

    #[inline]
    fn len(&self) -> usize {
        Colony::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        Colony::clear(self);
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        name_of::<C>()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
