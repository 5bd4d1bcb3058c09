//! Typed iteration over the components of a registry.
//!
//! # Architecture
//!
//! A [`Query`] names what [`Registry::range`] iterates:
//!
//! - A single component `C` walks `C`'s colony directly and yields `&mut C`. No view is
//!   built and the owning entities are not exposed.
//! - A tuple `(A, B, ..)` goes through the view cache and yields
//!   `(Entity, (&mut A, &mut B, ..))` for every entity owning all of the types.
//!
//! ```rust
//! use colony_ecs::ecs::{Component, Registry};
//!
//! #[derive(Component)]
//! struct Position(f32);
//!
//! #[derive(Component)]
//! struct Velocity(f32);
//!
//! let mut registry = Registry::new();
//! registry.create((Position(0.0), Velocity(2.0))).unwrap();
//!
//! for (_, (vel, pos)) in registry.range::<(Velocity, Position)>().unwrap() {
//!     pos.0 += vel.0;
//! }
//! for pos in registry.range::<Position>().unwrap() {
//!     assert_eq!(pos.0, 2.0);
//! }
//! ```
//!
//! Views store component slots in canonical (sorted type id) order. Each iterator carries
//! a permutation from the caller's order to the view's, so `(A, B)` and `(B, A)` share one
//! cached view while each yields its components in the order it asked for.
//!
//! # Safety
//!
//! Tuple iteration hands out several `&mut` into different colonies at once. The tuple's
//! types are checked to be distinct before any pointer is taken, so no two references can
//! name the same slot, and the registry stays mutably borrowed for as long as the iterator
//! lives.

use std::{marker::PhantomData, ptr::NonNull};

use crate::{
    all_tuples,
    ecs::{
        component::{Component, IntoSpec, Spec, TypeId},
        entity::Entity,
        error::Result,
        registry::Registry,
        storage::{Colony, colony::IterMut},
        view::View,
    },
};

/// Something [`Registry::range`] can iterate: a component, or a tuple of components.
pub trait Query: IntoSpec + 'static {
    /// The value yielded per match.
    type Item<'w>;

    /// The iterator over every match.
    type Iter<'w>: Iterator<Item = Self::Item<'w>>;

    /// Begin iterating `registry`.
    ///
    /// Fails with [`Error::DuplicateComponent`](crate::ecs::Error::DuplicateComponent) if a
    /// type is named twice.
    fn iter(registry: &mut Registry) -> Result<Self::Iter<'_>>;
}

impl<C: Component> Query for C {
    type Item<'w> = &'w mut C;
    type Iter<'w> = IterMut<'w, C>;

    fn iter(registry: &mut Registry) -> Result<Self::Iter<'_>> {
        Ok(registry.columns_mut().get_or_create::<C>().iter_mut())
    }
}

/// Fetches one view entry's components out of a tuple of colonies.
pub trait Fetch {
    type Item<'w>;

    /// Get the components at `slots`, taking the colony for the `n`th tuple element from
    /// `slots[order[n]]`.
    ///
    /// # Safety
    /// - every colony pointer is valid for `'w`
    /// - the colonies are pairwise distinct
    /// - nothing else accesses the fetched slots during `'w`, and each entry is fetched at
    ///   most once
    unsafe fn fetch<'w>(&self, slots: &[usize], order: &[usize]) -> Option<Self::Item<'w>>;
}

/// Iterator over a cached view, yielding each entity with its components.
pub struct ViewIter<'w, F: Fetch> {
    view: &'w View,
    order: Vec<usize>,
    colonies: F,
    cursor: usize,
    _marker: PhantomData<&'w mut ()>,
}

impl<'w, F: Fetch> ViewIter<'w, F> {
    fn new(view: &'w View, order: Vec<usize>, colonies: F) -> Self {
        Self {
            view,
            order,
            colonies,
            cursor: 0,
            _marker: PhantomData,
        }
    }

    /// The permutation from the requested type order to the view's canonical order.
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

impl<'w, F: Fetch> Iterator for ViewIter<'w, F> {
    type Item = (Entity, F::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((entity, slots)) = self.view.entry(self.cursor) {
            self.cursor += 1;
            // SAFETY: the registry is mutably borrowed for 'w, the query's types were checked
            // distinct, and the cursor visits each entry once.
            if let Some(items) = unsafe { self.colonies.fetch(slots, &self.order) } {
                return Some((entity, items));
            }
            debug_assert!(false, "view entry of {entity} points at a vacant slot");
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len().saturating_sub(self.cursor);
        (0, Some(remaining))
    }
}

/// Map each requested type to its position in the view's canonical order.
fn permutation(requested: &[TypeId], spec: &Spec) -> Vec<usize> {
    let order: Vec<usize> = requested
        .iter()
        .filter_map(|id| spec.position(*id))
        .collect();
    debug_assert_eq!(order.len(), requested.len());
    order
}

macro_rules! tuple_query {
    ($($name: ident),*) => {
        impl<$($name: Component),*> Fetch for ($(NonNull<Colony<$name>>,)*) {
            type Item<'w> = ($(&'w mut $name,)*);

            unsafe fn fetch<'w>(&self, slots: &[usize], order: &[usize]) -> Option<Self::Item<'w>> {
                #[allow(non_snake_case)]
                let ($($name,)*) = self;
                let mut order = order.iter();
                Some(($({
                    let slot = *slots.get(*order.next()?)?;
                    // SAFETY: upheld by the caller.
                    let value = unsafe { $name.as_ref() }.slot_ptr(slot)?;
                    unsafe { &mut *value.as_ptr() }
                },)*))
            }
        }

        impl<$($name: Component),*> Query for ($($name,)*) {
            type Item<'w> = (Entity, ($(&'w mut $name,)*));
            type Iter<'w> = ViewIter<'w, ($(NonNull<Colony<$name>>,)*)>;

            fn iter(registry: &mut Registry) -> Result<Self::Iter<'_>> {
                let requested = <Self as IntoSpec>::type_ids();
                let spec = Spec::distinct(requested.clone())?;
                let (view, columns) = registry.view_and_columns(spec);

                // Create every colony before taking any pointer.
                $(columns.get_or_create::<$name>();)*
                let colonies = ($(columns.pointer::<$name>(),)*);

                let order = permutation(&requested, view.spec());
                Ok(ViewIter::new(view, order, colonies))
            }
        }
    }
}

all_tuples!(tuple_query);

#[cfg(test)]
mod tests {
    use colony_macros::Component;

    use super::*;
    use crate::ecs::{component::id_of, error::Error};

    #[derive(Component, Debug, PartialEq)]
    struct Alpha(u8);
    #[derive(Component, Debug, PartialEq)]
    struct Beta(u8);
    #[derive(Component, Debug, PartialEq)]
    struct Gamma(u8);

    #[test]
    fn permutation_maps_to_canonical_positions() {
        // Given
        let requested = vec![id_of::<Gamma>(), id_of::<Alpha>(), id_of::<Beta>()];
        let spec = Spec::new(requested.clone());

        // When
        let order = permutation(&requested, &spec);

        // Then
        for (n, id) in requested.iter().enumerate() {
            assert_eq!(spec.ids()[order[n]], *id);
        }
    }

    #[test]
    fn single_component_walks_the_colony() {
        // Given
        let mut registry = Registry::new();
        registry.create(Alpha(1)).unwrap();
        registry.create((Alpha(2), Beta(0))).unwrap();

        // When
        let values: Vec<u8> = registry.range::<Alpha>().unwrap().map(|a| a.0).collect();

        // Then
        assert_eq!(values, vec![1, 2]);
        assert_eq!(registry.view_count(), 0);
    }

    #[test]
    fn tuple_order_is_the_callers() {
        // Given
        let mut registry = Registry::new();
        let entity = registry.create((Alpha(1), Beta(2), Gamma(3))).unwrap();

        // When
        let forward: Vec<_> = registry
            .range::<(Alpha, Gamma)>()
            .unwrap()
            .map(|(e, (a, g))| (e, a.0, g.0))
            .collect();
        let backward: Vec<_> = registry
            .range::<(Gamma, Alpha)>()
            .unwrap()
            .map(|(e, (g, a))| (e, g.0, a.0))
            .collect();

        // Then
        assert_eq!(forward, vec![(entity, 1, 3)]);
        assert_eq!(backward, vec![(entity, 3, 1)]);
        assert_eq!(registry.view_count(), 1);
    }

    #[test]
    fn repeated_type_is_rejected() {
        // Given
        let mut registry = Registry::new();
        registry.create((Alpha(1), Beta(1))).unwrap();

        // When
        let result = registry.range::<(Alpha, Beta, Alpha)>().map(|iter| iter.count());

        // Then
        assert!(matches!(result, Err(Error::DuplicateComponent { .. })));
        assert_eq!(registry.view_count(), 0);
    }

    #[test]
    fn mutation_through_a_view_is_visible() {
        // Given
        let mut registry = Registry::new();
        let a = registry.create((Alpha(1), Beta(10))).unwrap();
        let b = registry.create((Beta(20), Alpha(2))).unwrap();

        // When
        for (_, (beta, alpha)) in registry.range::<(Beta, Alpha)>().unwrap() {
            alpha.0 += beta.0;
        }

        // Then
        assert_eq!(registry.get::<Alpha>(a), Ok(&Alpha(11)));
        assert_eq!(registry.get::<Alpha>(b), Ok(&Alpha(22)));
    }
}
