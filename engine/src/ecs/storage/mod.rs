//! Per-type component storage for the ECS.
//!
//! Every component type gets exactly one [`Colony`], created the first time the type is
//! stored and kept for the lifetime of the registry. The registry reaches colonies through
//! [`Columns`], a table keyed by the component's [`TypeId`]:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  Columns                                      │
//! │  TypeId(0) → Box<dyn Column> = Colony<Pos>    │
//! │  TypeId(1) → Box<dyn Column> = Colony<Vel>    │
//! └───────────────┬───────────────────────────────┘
//!                 │
//! ┌───────────────▼───────────────────────────────┐
//! │  Colony<T>                                    │
//! │  - Vec<Slab<T>> with a global occupancy bit   │
//! │  - stable index = slab * slab_size + local    │
//! └───────────────┬───────────────────────────────┘
//!                 │
//! ┌───────────────▼───────────────────────────────┐
//! │  Slab<T>                                      │
//! │  - fixed buffer, index-based free list        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Typed access downcasts the erased [`Column`] back to its colony. Untyped access (the
//! teardown of an entity, which only knows its components' ids) goes through the trait.
//!
//! Singletons live beside the columns in [`Singletons`].

pub mod colony;
pub mod column;
pub mod slab;
pub mod unique;

use std::{collections::HashMap, ptr::NonNull};

pub use colony::Colony;
pub use column::Column;
pub use slab::Slab;
pub use unique::Singletons;

use crate::ecs::component::{Component, TypeId, id_of, name_of};

/// The table of colonies, one per component type.
pub struct Columns {
    slab_size: usize,
    columns: HashMap<TypeId, Box<dyn Column>>,
}

impl Columns {
    /// Create an empty table whose colonies use `slab_size` slots per slab.
    pub fn new(slab_size: usize) -> Self {
        assert!(slab_size > 0, "slab size must be at least 1");
        Self {
            slab_size,
            columns: HashMap::new(),
        }
    }

    #[inline]
    pub fn slab_size(&self) -> usize {
        self.slab_size
    }

    /// Get the number of colonies created so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get the colony for `C`, if one was created.
    pub fn get<C: Component>(&self) -> Option<&Colony<C>> {
        self.columns
            .get(&id_of::<C>())
            .map(|column| downcast_ref::<C>(&**column))
    }

    /// Get the colony for `C` mutably, if one was created.
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut Colony<C>> {
        self.columns
            .get_mut(&id_of::<C>())
            .map(|column| downcast_mut::<C>(&mut **column))
    }

    /// Get the colony for `C`, creating it on first use.
    pub fn get_or_create<C: Component>(&mut self) -> &mut Colony<C> {
        let slab_size = self.slab_size;
        let column = self.columns.entry(id_of::<C>()).or_insert_with(|| {
            log::trace!("creating colony for {}", name_of::<C>());
            Box::new(Colony::<C>::with_slab_size(slab_size))
        });
        downcast_mut::<C>(&mut **column)
    }

    /// Get a raw pointer to the colony for `C`, creating it on first use.
    ///
    /// The colony is boxed, so the pointer stays valid until the table is dropped.
    #[inline]
    pub(crate) fn pointer<C: Component>(&mut self) -> NonNull<Colony<C>> {
        NonNull::from(self.get_or_create::<C>())
    }

    /// Get the erased column for `id`.
    #[inline]
    pub fn column(&self, id: TypeId) -> Option<&dyn Column> {
        self.columns.get(&id).map(|column| &**column)
    }

    /// Drop the value at `index` of the column for `id`.
    ///
    /// Returns false if there is no such column or the index was not occupied.
    pub fn erase(&mut self, id: TypeId, index: usize) -> bool {
        self.columns
            .get_mut(&id)
            .is_some_and(|column| column.erase(index))
    }

    /// Drop every stored value, keeping the colonies.
    pub fn clear(&mut self) {
        for column in self.columns.values_mut() {
            column.clear();
        }
    }
}

/// A column stored under `id_of::<C>()` is always a `Colony<C>`.
fn downcast_ref<C: Component>(column: &dyn Column) -> &Colony<C> {
    match column.as_any().downcast_ref::<Colony<C>>() {
        Some(colony) => colony,
        None => panic!(
            "column of {} is stored under the id of {}",
            column.type_name(),
            name_of::<C>()
        ),
    }
}

fn downcast_mut<C: Component>(column: &mut dyn Column) -> &mut Colony<C> {
    let stored = column.type_name();
    match column.as_any_mut().downcast_mut::<Colony<C>>() {
        Some(colony) => colony,
        None => panic!(
            "column of {stored} is stored under the id of {}",
            name_of::<C>()
        ),
    }
}
