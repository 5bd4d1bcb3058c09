//! The registry is the central container for entities, their components and singletons.
//!
//! # Architecture
//!
//! The registry coordinates several parts:
//! - **Allocator**: hands out entity handles, monotonically and without reuse
//! - **Entity table**: maps each live entity to its [`EntityInfo`] (owned types and their
//!   colony slots), ordered by creation
//! - **Columns**: one [`Colony`](crate::ecs::storage::Colony) per component type
//! - **View cache**: one [`View`] per queried set of types, maintained incrementally
//! - **Singletons**: at most one value per singleton type
//!
//! # Lifecycle
//!
//! ```text
//! create(set) ── validate distinct ── insert each value ── record slots ── push into views
//! emplace(e, c) ─ reject duplicate ── insert value ───── record slot ──── push into views
//! remove::<C>(e) ─────────────────── erase from views ─── forget slot ─── erase value
//! destroy(e) ─────────────────────── erase from views ─── erase every owned value
//! ```
//!
//! # Example
//!
//! ```rust
//! use colony_ecs::ecs::{Component, Error, Registry};
//!
//! #[derive(Component, Debug, PartialEq)]
//! struct Health(u32);
//!
//! #[derive(Component)]
//! struct Armor(u32);
//!
//! let mut registry = Registry::new();
//! let knight = registry.create((Health(100), Armor(5))).unwrap();
//!
//! registry.get_mut::<Health>(knight).unwrap().0 -= 30;
//! assert_eq!(registry.get::<Health>(knight), Ok(&Health(70)));
//!
//! registry.destroy(knight).unwrap();
//! assert_eq!(registry.get::<Health>(knight), Err(Error::NoSuchEntity(knight)));
//! ```

mod config;

use std::collections::BTreeMap;

pub use config::Config;

use crate::ecs::{
    component::{Component, Set, Spec, Target, TypeId, id_of, name_of},
    entity::{Allocator, Entity, EntityInfo},
    error::{Error, Result},
    query::Query,
    singleton::Singleton,
    storage::{Columns, Singletons},
    view::{View, ViewCache},
};

/// The owner of every entity, component and singleton.
///
/// A registry is single-threaded: it is neither `Send` nor `Sync`, and all access goes
/// through `&self` / `&mut self`.
pub struct Registry {
    config: Config,

    allocator: Allocator,

    /// Live entities in creation order.
    entities: BTreeMap<Entity, EntityInfo>,

    columns: Columns,

    views: ViewCache,

    singletons: Singletons,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty registry.
    ///
    /// # Panics
    /// - if `config.slab_size` is zero
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            allocator: Allocator::new(),
            entities: BTreeMap::new(),
            columns: Columns::new(config.slab_size),
            views: ViewCache::new(config.view_warn_threshold),
            singletons: Singletons::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns true if `entity` is live in this registry.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Iterate over live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    /// Get the set of component types `entity` owns.
    pub fn archetype(&self, entity: Entity) -> Result<&Spec> {
        self.info(entity).map(EntityInfo::archetype)
    }

    /// Get the number of cached views.
    #[inline]
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Create an entity owning no components.
    pub fn create_empty(&mut self) -> Entity {
        let entity = self.allocator.alloc();
        let info = EntityInfo::new();
        self.views.insert(entity, &info);
        self.entities.insert(entity, info);
        log::debug!("created {entity} with no components");
        entity
    }

    /// Create an entity owning every component in `set`.
    ///
    /// Fails with [`Error::DuplicateComponent`] if `set` names a type twice, in which case
    /// nothing is stored and no handle is consumed.
    pub fn create<S: Set>(&mut self, set: S) -> Result<Entity> {
        Spec::of::<S>()?;
        Ok(self.create_unchecked(set))
    }

    /// Create one entity per set, in iteration order.
    ///
    /// The set type is validated once, before any entity is created.
    pub fn create_many<S: Set>(&mut self, sets: impl IntoIterator<Item = S>) -> Result<Vec<Entity>> {
        Spec::of::<S>()?;
        Ok(sets
            .into_iter()
            .map(|set| self.create_unchecked(set))
            .collect())
    }

    fn create_unchecked<S: Set>(&mut self, set: S) -> Entity {
        let entity = self.allocator.alloc();
        let mut info = EntityInfo::new();
        set.apply(&mut Inserter {
            entity,
            columns: &mut self.columns,
            info: &mut info,
        });

        self.views.insert(entity, &info);
        log::debug!(
            "created {entity} with {} components (archetype {:016x})",
            info.len(),
            info.archetype().fingerprint()
        );
        self.entities.insert(entity, info);
        entity
    }

    /// Destroy `entity`, dropping every component it owns.
    ///
    /// Fails with [`Error::NoSuchEntity`] if the entity is not live.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        let info = self
            .entities
            .get(&entity)
            .ok_or(Error::NoSuchEntity(entity))?;
        self.views.remove(entity, info)?;

        let Some(info) = self.entities.remove(&entity) else {
            return Err(Error::NoSuchEntity(entity));
        };
        for (id, slot) in info.slots() {
            let erased = self.columns.erase(id, slot);
            debug_assert!(erased, "{entity} recorded a vacant slot {slot}");
        }
        log::debug!("destroyed {entity} and {} components", info.len());
        Ok(())
    }

    /// Get the component of type `C` owned by `entity`.
    pub fn get<C: Component>(&self, entity: Entity) -> Result<&C> {
        let slot = self.slot_of::<C>(entity)?;
        self.columns
            .get::<C>()
            .and_then(|colony| colony.get(slot))
            .ok_or(Error::NoSuchComponent {
                entity,
                component: name_of::<C>(),
            })
    }

    /// Get the component of type `C` owned by `entity`, mutably.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Result<&mut C> {
        let slot = self.slot_of::<C>(entity)?;
        self.columns
            .get_mut::<C>()
            .and_then(|colony| colony.get_mut(slot))
            .ok_or(Error::NoSuchComponent {
                entity,
                component: name_of::<C>(),
            })
    }

    /// Returns true if `entity` is live and owns a component of type `C`.
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|info| info.owns(id_of::<C>()))
    }

    /// Attach `value` to `entity`, returning the stored component.
    ///
    /// Fails with [`Error::NoSuchEntity`] if the entity is not live, or with
    /// [`Error::DuplicateComponent`] if it already owns a `C`; the existing component is
    /// left untouched.
    pub fn emplace<C: Component>(&mut self, entity: Entity, mut value: C) -> Result<&mut C> {
        let id = id_of::<C>();
        let info = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::NoSuchEntity(entity))?;
        if info.owns(id) {
            return Err(Error::DuplicateComponent {
                component: name_of::<C>(),
            });
        }

        value.attach(entity);
        let colony = self.columns.get_or_create::<C>();
        let slot = colony.insert(value);
        info.insert(id, slot);
        self.views.extend(entity, id, info);
        log::debug!("emplaced {} on {entity}", name_of::<C>());

        colony.at_mut(slot)
    }

    /// Detach and return the component of type `C` owned by `entity`.
    ///
    /// The entity stays live and leaves every view that required `C`. The returned value no
    /// longer records an owner.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Result<C> {
        let id = id_of::<C>();
        let missing = Error::NoSuchComponent {
            entity,
            component: name_of::<C>(),
        };
        let info = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::NoSuchEntity(entity))?;
        if !info.owns(id) {
            return Err(missing);
        }

        self.views.shrink(entity, id, info)?;
        let slot = info.remove(id).ok_or(missing.clone())?;
        log::debug!("removed {} from {entity}", name_of::<C>());
        let mut value = self
            .columns
            .get_mut::<C>()
            .and_then(|colony| colony.erase(slot))
            .ok_or(missing)?;
        value.detach();
        Ok(value)
    }

    /// Iterate over the components named by `Q`.
    ///
    /// A single component type walks its colony and yields `&mut C`. A tuple yields
    /// `(Entity, (&mut A, &mut B, ..))` for every entity owning all of the types, in the
    /// order the tuple names them, building the view on first request.
    pub fn range<Q: Query>(&mut self) -> Result<Q::Iter<'_>> {
        Q::iter(self)
    }

    /// Iterate over every live component of type `C`.
    pub fn components<C: Component>(&self) -> impl Iterator<Item = &C> + '_ {
        self.columns.get::<C>().into_iter().flatten()
    }

    /// Get the entity that owns `component`.
    ///
    /// Fails with [`Error::NotOwned`] unless the component records its owner and that owner
    /// is live.
    pub fn entity_of<C: Component>(&self, component: &C) -> Result<Entity> {
        component
            .owner()
            .filter(|owner| self.contains(*owner))
            .ok_or(Error::NotOwned {
                component: name_of::<C>(),
            })
    }

    /// Returns true if the owner of `component` also owns a component of type `S`.
    ///
    /// Fails with [`Error::NotOwned`] like [`Registry::entity_of`] when there is no live owner.
    pub fn has_sibling<S: Component>(&self, component: &impl Component) -> Result<bool> {
        let owner = self.entity_of(component)?;
        Ok(self.has::<S>(owner))
    }

    /// Get the component of type `S` owned by the owner of `component`.
    pub fn sibling<S: Component>(&self, component: &impl Component) -> Result<&S> {
        let owner = self.entity_of(component)?;
        self.get::<S>(owner)
    }

    /// Get the singleton of type `S`.
    ///
    /// Fails with [`Error::NoSuchSingleton`] if none was inserted.
    #[inline]
    pub fn singleton<S: Singleton>(&self) -> Result<&S> {
        self.singletons.get::<S>()
    }

    #[inline]
    pub fn singleton_mut<S: Singleton>(&mut self) -> Result<&mut S> {
        self.singletons.get_mut::<S>()
    }

    /// Store the singleton `value`.
    ///
    /// Fails with [`Error::SingletonExists`] if one of its type is already stored.
    pub fn insert_singleton<S: Singleton>(&mut self, value: S) -> Result<&mut S> {
        log::debug!("inserting singleton {}", name_of::<S>());
        self.singletons.insert(value)
    }

    #[inline]
    pub fn has_singleton<S: Singleton>(&self) -> bool {
        self.singletons.contains::<S>()
    }

    /// Remove and return the singleton of type `S`, if stored.
    #[inline]
    pub fn remove_singleton<S: Singleton>(&mut self) -> Option<S> {
        self.singletons.remove::<S>()
    }

    #[inline]
    pub(crate) fn columns_mut(&mut self) -> &mut Columns {
        &mut self.columns
    }

    /// Get the view for `spec`, building it if needed, alongside the columns it indexes.
    pub(crate) fn view_and_columns(&mut self, spec: Spec) -> (&View, &mut Columns) {
        let Registry {
            entities,
            columns,
            views,
            ..
        } = self;
        let view = views.get_or_build(spec, entities.iter().map(|(entity, info)| (*entity, info)));
        (view, columns)
    }

    #[inline]
    fn info(&self, entity: Entity) -> Result<&EntityInfo> {
        self.entities
            .get(&entity)
            .ok_or(Error::NoSuchEntity(entity))
    }

    fn slot_of<C: Component>(&self, entity: Entity) -> Result<usize> {
        self.info(entity)?
            .slot(id_of::<C>())
            .ok_or(Error::NoSuchComponent {
                entity,
                component: name_of::<C>(),
            })
    }
}

/// Moves the values of a [`Set`] into their colonies on behalf of one entity.
struct Inserter<'a> {
    entity: Entity,
    columns: &'a mut Columns,
    info: &'a mut EntityInfo,
}

impl Target for Inserter<'_> {
    fn apply<C: Component>(&mut self, id: TypeId, mut value: C) {
        value.attach(self.entity);
        let slot = self.columns.get_or_create::<C>().insert(value);
        let recorded = self.info.insert(id, slot);
        debug_assert!(recorded, "{} inserted twice", name_of::<C>());
    }
}
