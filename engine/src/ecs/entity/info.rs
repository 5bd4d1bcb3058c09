use crate::ecs::component::{Spec, TypeId};

/// What the registry knows about one live entity.
///
/// `archetype` is the set of component types the entity owns. `slots` records, for each
/// owned type, the index of the component in that type's colony. Both are kept sorted by
/// type id so they always line up, and tearing an entity down is a walk over `slots`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInfo {
    archetype: Spec,
    slots: Vec<(TypeId, usize)>,
}

impl EntityInfo {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the set of component types the entity owns.
    #[inline]
    pub fn archetype(&self) -> &Spec {
        &self.archetype
    }

    /// Returns true if the entity owns a component of type `id`.
    #[inline]
    pub fn owns(&self, id: TypeId) -> bool {
        self.archetype.contains(id)
    }

    /// Get the colony index of the component of type `id`.
    #[inline]
    pub fn slot(&self, id: TypeId) -> Option<usize> {
        self.slots
            .binary_search_by_key(&id, |(owned, _)| *owned)
            .ok()
            .map(|at| self.slots[at].1)
    }

    /// Iterate over `(type id, colony index)` of every owned component, by type id.
    #[inline]
    pub fn slots(&self) -> impl Iterator<Item = (TypeId, usize)> + '_ {
        self.slots.iter().copied()
    }

    /// Get the colony indices of the components named by `spec`, in `spec` order.
    ///
    /// Returns `None` unless the entity owns every type in `spec`.
    pub fn slots_for(&self, spec: &Spec) -> Option<Vec<usize>> {
        spec.ids().iter().map(|id| self.slot(*id)).collect()
    }

    /// Record ownership of a component of type `id` stored at `slot`.
    ///
    /// Returns false, leaving the info unchanged, if the type is already owned.
    pub fn insert(&mut self, id: TypeId, slot: usize) -> bool {
        match self.slots.binary_search_by_key(&id, |(owned, _)| *owned) {
            Ok(_) => false,
            Err(at) => {
                self.slots.insert(at, (id, slot));
                self.archetype = self.archetype.with(id);
                true
            }
        }
    }

    /// Forget the component of type `id`, returning its colony index.
    pub fn remove(&mut self, id: TypeId) -> Option<usize> {
        let at = self
            .slots
            .binary_search_by_key(&id, |(owned, _)| *owned)
            .ok()?;
        let (_, slot) = self.slots.remove(at);
        self.archetype = self.archetype.without(id);
        Some(slot)
    }

    /// Get the number of owned components.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_the_archetype() {
        // Given
        let mut info = EntityInfo::new();
        let (a, b, c) = (TypeId::new(900), TypeId::new(901), TypeId::new(902));

        // When
        assert!(info.insert(c, 7));
        assert!(info.insert(a, 3));
        assert!(info.insert(b, 0));

        // Then
        assert_eq!(info.archetype(), &Spec::new(vec![a, b, c]));
        assert_eq!(info.slots().collect::<Vec<_>>(), vec![(a, 3), (b, 0), (c, 7)]);
        assert_eq!(info.slot(c), Some(7));
        assert_eq!(info.len(), 3);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        // Given
        let mut info = EntityInfo::new();
        let id = TypeId::new(910);
        info.insert(id, 1);

        // When
        let inserted = info.insert(id, 2);

        // Then
        assert!(!inserted);
        assert_eq!(info.slot(id), Some(1));
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn slots_for_requires_every_type() {
        // Given
        let mut info = EntityInfo::new();
        let (a, b, c) = (TypeId::new(920), TypeId::new(921), TypeId::new(922));
        info.insert(a, 10);
        info.insert(b, 20);

        // Then
        assert_eq!(info.slots_for(&Spec::new(vec![b, a])), Some(vec![10, 20]));
        assert_eq!(info.slots_for(&Spec::new(vec![a, c])), None);
    }

    #[test]
    fn remove_shrinks_the_archetype() {
        // Given
        let mut info = EntityInfo::new();
        let (a, b) = (TypeId::new(930), TypeId::new(931));
        info.insert(a, 4);
        info.insert(b, 5);

        // When
        let removed = info.remove(a);

        // Then
        assert_eq!(removed, Some(4));
        assert_eq!(info.remove(a), None);
        assert!(!info.owns(a));
        assert_eq!(info.archetype(), &Spec::new(vec![b]));
    }
}
