//! Cached views over the entities that own a given set of component types.
//!
//! # Architecture
//!
//! A [`View`] is built the first time a set of types is queried and is kept for the life of
//! the registry. It is a flat list of entries, one per captured entity:
//!
//! ```text
//! required: Spec[Pos, Vel]                (stride 2)
//!
//! entities: [   e1    ][   e4    ][   e7    ]
//! slots:    [ 3 ][ 0 ][ 5 ][ 1 ][ 9 ][ 2 ]
//!             Pos  Vel  Pos  Vel  Pos  Vel
//! ```
//!
//! Slots are colony indices laid out in the `Spec`'s canonical order. Querying the same types
//! in a different order returns the same view; the caller's order is restored with a
//! permutation when iterating.
//!
//! The [`ViewCache`] keeps every view up to date incrementally. Entities are appended as
//! they are created or gain a required component, and erased as they are destroyed or lose
//! one, so a view never has to be rebuilt.
//!
//! # Building
//!
//! The first scan walks every live entity in creation order. Entities are grouped by their
//! archetype: the containment test runs once per distinct archetype and its verdict is
//! reused for every other entity with the same archetype.

use std::collections::HashMap;

use crate::ecs::{
    component::{Spec, TypeId},
    entity::{Entity, EntityInfo},
    error::{Error, Result},
};

/// The cached entities and component slots for one required set of types.
#[derive(Debug, Clone)]
pub struct View {
    spec: Spec,
    entities: Vec<Entity>,
    slots: Vec<usize>,
}

impl View {
    /// Create an empty view of the entities owning every type in `spec`.
    pub fn new(spec: Spec) -> Self {
        Self {
            spec,
            entities: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Get the required set of types.
    #[inline]
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// Get the number of slots per entry.
    #[inline]
    pub fn stride(&self) -> usize {
        self.spec.len()
    }

    /// Get the number of captured entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get the captured entities in the order they were appended.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Returns true if an entity owning `owned` belongs in this view.
    #[inline]
    pub fn captures(&self, owned: &Spec) -> bool {
        owned.contains_all(&self.spec)
    }

    /// Get the entry at `position`: the entity and its slots in spec order.
    pub fn entry(&self, position: usize) -> Option<(Entity, &[usize])> {
        let entity = *self.entities.get(position)?;
        let start = position * self.stride();
        let slots = self.slots.get(start..start + self.stride())?;
        Some((entity, slots))
    }

    /// Iterate over every entry in append order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &[usize])> + '_ {
        (0..self.len()).filter_map(move |position| self.entry(position))
    }

    /// Append an entry. `slots` must be given in spec order.
    pub fn push_back(&mut self, entity: Entity, slots: &[usize]) {
        debug_assert_eq!(slots.len(), self.stride(), "entry of the wrong stride");
        self.entities.push(entity);
        self.slots.extend_from_slice(slots);
    }

    /// Remove the entry of `entity`, keeping the order of the others.
    ///
    /// Fails with [`Error::EntityNotFound`] if the entity is not in the view, or with
    /// [`Error::ViewCorruption`] if its entry is missing trailing slots.
    pub fn erase(&mut self, entity: Entity) -> Result<()> {
        let position = self
            .entities
            .iter()
            .position(|captured| *captured == entity)
            .ok_or(Error::EntityNotFound { entity })?;

        let start = position * self.stride();
        let end = start + self.stride();
        if end > self.slots.len() {
            return Err(Error::ViewCorruption { entity });
        }

        self.entities.remove(position);
        self.slots.drain(start..end);
        Ok(())
    }

    /// Scan `entities` for every one this view captures, appending them in encountered order.
    ///
    /// Returns the number of distinct archetypes that were tested.
    pub fn scan<'a>(&mut self, entities: impl IntoIterator<Item = (Entity, &'a EntityInfo)>) -> usize {
        let mut verdicts: HashMap<&'a Spec, bool> = HashMap::new();
        let mut slots = Vec::with_capacity(self.stride());

        for (entity, info) in entities {
            let captured = *verdicts
                .entry(info.archetype())
                .or_insert_with(|| self.captures(info.archetype()));
            if !captured {
                continue;
            }

            slots.clear();
            slots.extend(self.spec.ids().iter().filter_map(|id| info.slot(*id)));
            self.push_back(entity, &slots);
        }

        verdicts.len()
    }
}

/// Every view built by a registry, keyed by its required set of types.
#[derive(Debug)]
pub struct ViewCache {
    views: HashMap<Spec, View>,
    warn_threshold: usize,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl ViewCache {
    /// Create an empty cache that warns once more than `warn_threshold` views exist.
    pub fn new(warn_threshold: usize) -> Self {
        Self {
            views: HashMap::new(),
            warn_threshold,
        }
    }

    /// Get the number of cached views.
    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[inline]
    pub fn get(&self, spec: &Spec) -> Option<&View> {
        self.views.get(spec)
    }

    /// Get the view for `spec`, building it from `entities` on first request.
    pub fn get_or_build<'a>(
        &mut self,
        spec: Spec,
        entities: impl IntoIterator<Item = (Entity, &'a EntityInfo)>,
    ) -> &View {
        let count = self.views.len();
        let warn_threshold = self.warn_threshold;

        self.views.entry(spec).or_insert_with_key(|spec| {
            let mut view = View::new(spec.clone());
            let archetypes = view.scan(entities);
            log::debug!(
                "built view {:016x} over {} types: {} entities from {} archetypes",
                spec.fingerprint(),
                spec.len(),
                view.len(),
                archetypes
            );
            if count == warn_threshold {
                log::warn!(
                    "more than {warn_threshold} views are cached; views are never evicted"
                );
            }
            view
        })
    }

    /// Append a newly created entity to every view that captures it.
    pub fn insert(&mut self, entity: Entity, info: &EntityInfo) {
        for view in self.views.values_mut() {
            if view.captures(info.archetype()) {
                Self::push(view, entity, info);
            }
        }
    }

    /// Append `entity` to every view that it joins by gaining a component of type `added`.
    ///
    /// `info` must already include the new component.
    pub fn extend(&mut self, entity: Entity, added: TypeId, info: &EntityInfo) {
        for view in self.views.values_mut() {
            if view.spec().contains(added) && view.captures(info.archetype()) {
                Self::push(view, entity, info);
            }
        }
    }

    /// Erase `entity` from every view that captures it.
    ///
    /// `info` is the entity's bookkeeping before teardown.
    pub fn remove(&mut self, entity: Entity, info: &EntityInfo) -> Result<()> {
        for view in self.views.values_mut() {
            if view.captures(info.archetype()) {
                view.erase(entity)?;
                log::trace!("erased {entity} from view {:016x}", view.spec().fingerprint());
            }
        }
        Ok(())
    }

    /// Erase `entity` from every view that it leaves by losing its component of type `lost`.
    ///
    /// `info` is the entity's bookkeeping before the component is dropped.
    pub fn shrink(&mut self, entity: Entity, lost: TypeId, info: &EntityInfo) -> Result<()> {
        for view in self.views.values_mut() {
            if view.spec().contains(lost) && view.captures(info.archetype()) {
                view.erase(entity)?;
            }
        }
        Ok(())
    }

    fn push(view: &mut View, entity: Entity, info: &EntityInfo) {
        if let Some(slots) = info.slots_for(view.spec()) {
            view.push_back(entity, &slots);
            log::trace!("pushed {entity} into view {:016x}", view.spec().fingerprint());
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ids(raw: &[u32]) -> Vec<TypeId> {
        raw.iter().map(|id| TypeId::new(*id)).collect()
    }

    fn info(owned: &[(u32, usize)]) -> EntityInfo {
        let mut info = EntityInfo::new();
        for (id, slot) in owned {
            info.insert(TypeId::new(*id), *slot);
        }
        info
    }

    #[test]
    fn push_back_and_erase_keep_order() {
        // Given
        let mut view = View::new(Spec::new(ids(&[1, 2])));
        for raw in 1..=4 {
            view.push_back(Entity::from_raw(raw), &[raw as usize * 10, raw as usize * 10 + 1]);
        }

        // When
        view.erase(Entity::from_raw(2)).unwrap();

        // Then
        let entries: Vec<_> = view.iter().map(|(e, s)| (e.raw(), s.to_vec())).collect();
        assert_eq!(
            entries,
            vec![(1, vec![10, 11]), (3, vec![30, 31]), (4, vec![40, 41])]
        );
    }

    #[test]
    fn erase_of_missing_entity_fails() {
        // Given
        let mut view = View::new(Spec::new(ids(&[1])));
        view.push_back(Entity::from_raw(1), &[0]);

        // Then
        assert_eq!(
            view.erase(Entity::from_raw(9)),
            Err(Error::EntityNotFound {
                entity: Entity::from_raw(9)
            })
        );
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn erase_detects_short_entries() {
        // Given
        let mut view = View::new(Spec::new(ids(&[1, 2])));
        view.entities.push(Entity::from_raw(5));
        view.slots.push(0);

        // When
        let result = view.erase(Entity::from_raw(5));

        // Then
        assert_eq!(
            result,
            Err(Error::ViewCorruption {
                entity: Entity::from_raw(5)
            })
        );
    }

    #[test]
    fn captures_is_containment() {
        // Given
        let view = View::new(Spec::new(ids(&[1, 3])));

        // Then
        assert!(view.captures(&Spec::new(ids(&[1, 2, 3]))));
        assert!(view.captures(&Spec::new(ids(&[3, 1]))));
        assert!(!view.captures(&Spec::new(ids(&[1, 2]))));
        assert!(!view.captures(&Spec::EMPTY));
    }

    #[test]
    fn scan_tests_each_archetype_once() {
        // Given
        let infos = vec![
            (Entity::from_raw(1), info(&[(1, 0), (2, 0)])),
            (Entity::from_raw(2), info(&[(1, 1)])),
            (Entity::from_raw(3), info(&[(2, 1), (1, 2)])),
            (Entity::from_raw(4), info(&[(1, 3), (2, 2), (3, 0)])),
        ];
        let mut view = View::new(Spec::new(ids(&[2, 1])));

        // When
        let archetypes = view.scan(infos.iter().map(|(e, i)| (*e, i)));

        // Then
        assert_eq!(archetypes, 3);
        let entries: Vec<_> = view.iter().map(|(e, s)| (e.raw(), s.to_vec())).collect();
        assert_eq!(
            entries,
            vec![(1, vec![0, 0]), (3, vec![2, 1]), (4, vec![3, 2])]
        );
    }

    #[test]
    fn cache_is_built_once() {
        // Given
        let mut cache = ViewCache::new(8);
        let first = info(&[(1, 0)]);
        let spec = Spec::new(ids(&[1]));
        cache.get_or_build(spec.clone(), [(Entity::from_raw(1), &first)]);

        // When
        let second = info(&[(1, 1)]);
        let view = cache.get_or_build(spec, [(Entity::from_raw(2), &second)]);

        // Then
        assert_eq!(view.entities(), &[Entity::from_raw(1)]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn maintenance_follows_ownership() {
        // Given
        let mut cache = ViewCache::new(8);
        let ab = Spec::new(ids(&[1, 2]));
        let a = Spec::new(ids(&[1]));
        cache.get_or_build(ab.clone(), std::iter::empty());
        cache.get_or_build(a.clone(), std::iter::empty());
        let entity = Entity::from_raw(1);
        let mut owned = info(&[(1, 4)]);

        // When - created with A, then gains B
        cache.insert(entity, &owned);
        owned.insert(TypeId::new(2), 6);
        cache.extend(entity, TypeId::new(2), &owned);

        // Then
        assert_eq!(cache.get(&a).unwrap().entry(0), Some((entity, &[4][..])));
        assert_eq!(cache.get(&ab).unwrap().entry(0), Some((entity, &[4, 6][..])));
        assert_eq!(cache.get(&a).unwrap().len(), 1);

        // When - loses B
        cache.shrink(entity, TypeId::new(2), &owned).unwrap();
        owned.remove(TypeId::new(2));

        // Then
        assert!(cache.get(&ab).unwrap().is_empty());
        assert_eq!(cache.get(&a).unwrap().len(), 1);

        // When - destroyed
        cache.remove(entity, &owned).unwrap();

        // Then
        assert!(cache.get(&a).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn scan_matches_brute_force(
            archetypes in prop::collection::vec(prop::collection::btree_set(0u32..5, 0..5), 1..40),
            required in prop::collection::btree_set(0u32..5, 1..3),
        ) {
            let infos: Vec<_> = archetypes
                .iter()
                .enumerate()
                .map(|(n, owned)| {
                    let owned: Vec<_> = owned.iter().map(|id| (*id, n)).collect();
                    (Entity::from_raw(n as u64 + 1), info(&owned))
                })
                .collect();
            let spec = Spec::new(required.iter().map(|id| TypeId::new(*id)).collect::<Vec<_>>());

            let mut view = View::new(spec.clone());
            view.scan(infos.iter().map(|(e, i)| (*e, i)));

            let expected: Vec<_> = infos
                .iter()
                .filter(|(_, i)| i.archetype().contains_all(&spec))
                .map(|(e, _)| *e)
                .collect();
            prop_assert_eq!(view.entities(), &expected[..]);
        }
    }
}
