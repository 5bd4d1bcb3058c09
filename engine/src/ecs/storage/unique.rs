//! Type-keyed storage for singleton values.
//!
//! [`Singletons`] holds at most one value per [`Singleton`] type. It is a plain map from the
//! Rust type id to a boxed value; typed access downcasts back through the generic parameter,
//! so callers never see the erasure.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use crate::ecs::{
    component::name_of,
    error::{Error, Result},
    singleton::Singleton,
};

/// Storage for singleton values, one per type.
#[derive(Default)]
pub struct Singletons {
    data: HashMap<TypeId, Box<dyn Any>>,
}

impl Singletons {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, failing with [`Error::SingletonExists`] if one of its type is present.
    ///
    /// The stored value is left unchanged on failure.
    pub fn insert<S: Singleton>(&mut self, value: S) -> Result<&mut S> {
        match self.data.entry(TypeId::of::<S>()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(Error::SingletonExists {
                singleton: name_of::<S>(),
            }),
            std::collections::hash_map::Entry::Vacant(slot) => slot
                .insert(Box::new(value))
                .downcast_mut::<S>()
                .ok_or(Error::NoSuchSingleton {
                    singleton: name_of::<S>(),
                }),
        }
    }

    /// Get the singleton of type `S`.
    pub fn get<S: Singleton>(&self) -> Result<&S> {
        self.data
            .get(&TypeId::of::<S>())
            .and_then(|stored| stored.downcast_ref::<S>())
            .ok_or(Error::NoSuchSingleton {
                singleton: name_of::<S>(),
            })
    }

    pub fn get_mut<S: Singleton>(&mut self) -> Result<&mut S> {
        self.data
            .get_mut(&TypeId::of::<S>())
            .and_then(|stored| stored.downcast_mut::<S>())
            .ok_or(Error::NoSuchSingleton {
                singleton: name_of::<S>(),
            })
    }

    /// Remove the singleton of type `S`, returning it if present.
    pub fn remove<S: Singleton>(&mut self) -> Option<S> {
        self.data
            .remove(&TypeId::of::<S>())
            .and_then(|stored| stored.downcast::<S>().ok())
            .map(|boxed| *boxed)
    }

    #[inline]
    pub fn contains<S: Singleton>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<S>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
