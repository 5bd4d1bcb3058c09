use std::hash::{DefaultHasher, Hash, Hasher};

use crate::{
    all_tuples,
    ecs::{
        component::{Component, TypeId, TypeRegistry, id_of},
        error::{Error, Result},
    },
};

/// A description of a set of component types.
///
/// This is a sorted, duplicate-free vector of type ids. It is the archetype key of an entity
/// (the types it owns) and the key of a cached view (the types it requires). Because the key
/// is the full sequence rather than a combination of per-type hashes, two different type sets
/// can never compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Spec {
    ids: Vec<TypeId>,
}

impl Spec {
    /// The `Spec` of no component types.
    pub const EMPTY: Self = Spec { ids: Vec::new() };

    /// Construct a new Spec from the given ids, sorting and dropping duplicates.
    #[inline]
    pub fn new(ids: impl Into<Vec<TypeId>>) -> Self {
        let mut ids = ids.into();
        ids.sort_unstable();
        ids.dedup();
        ids.shrink_to_fit();
        Self { ids }
    }

    /// Construct a new Spec from ids that must be pairwise distinct.
    ///
    /// Fails with [`Error::DuplicateComponent`] naming the first repeated type.
    pub fn distinct(ids: impl Into<Vec<TypeId>>) -> Result<Self> {
        let mut ids = ids.into();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::DuplicateComponent {
                component: TypeRegistry::global().name(pair[0]),
            });
        }
        ids.shrink_to_fit();
        Ok(Self { ids })
    }

    /// Get the `Spec` of the component types named by `S`, which must be distinct.
    #[inline]
    pub fn of<S: IntoSpec>() -> Result<Self> {
        Self::distinct(S::type_ids())
    }

    /// Get the type ids in this spec, in canonical (sorted) order.
    #[inline]
    pub fn ids(&self) -> &[TypeId] {
        &self.ids
    }

    /// Determine if this spec contains the given id.
    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Get the canonical position of the given id within this spec.
    #[inline]
    pub fn position(&self, id: TypeId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Determine if this spec contains all ids of the other spec.
    #[inline]
    pub fn contains_all(&self, other: &Spec) -> bool {
        other.len() <= self.len() && other.ids.iter().all(|id| self.contains(*id))
    }

    /// Determine if this spec contains any id of the other spec.
    #[inline]
    pub fn contains_any(&self, other: &Spec) -> bool {
        other.ids.iter().any(|id| self.contains(*id))
    }

    /// A new spec that additionally contains `id`.
    pub fn with(&self, id: TypeId) -> Self {
        let mut ids = self.ids.clone();
        if let Err(at) = ids.binary_search(&id) {
            ids.insert(at, id);
        }
        Self { ids }
    }

    /// A new spec without `id`.
    pub fn without(&self, id: TypeId) -> Self {
        let ids = self.ids.iter().copied().filter(|i| *i != id).collect();
        Self { ids } // Already sorted
    }

    /// A hash of the sorted id sequence, for diagnostics.
    ///
    /// Equal specs always have equal fingerprints. Maps key on the `Spec` itself, never on
    /// the fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.ids.hash(&mut hasher);
        hasher.finish()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl From<Vec<TypeId>> for Spec {
    #[inline]
    fn from(value: Vec<TypeId>) -> Self {
        Spec::new(value)
    }
}

/// Types that name a list of component types: a single component, or a tuple of them.
pub trait IntoSpec {
    /// Append the component type ids, in declaration order and without deduplication.
    fn collect_ids(ids: &mut Vec<TypeId>);

    /// The component type ids in declaration order.
    fn type_ids() -> Vec<TypeId> {
        let mut ids = Vec::new();
        Self::collect_ids(&mut ids);
        ids
    }
}

impl IntoSpec for () {
    fn collect_ids(_ids: &mut Vec<TypeId>) {}
}

impl<C: Component> IntoSpec for C {
    fn collect_ids(ids: &mut Vec<TypeId>) {
        ids.push(id_of::<C>());
    }
}

macro_rules! tuple_spec {
    ($($name: ident),*) => {
        impl<$($name: IntoSpec),*> IntoSpec for ($($name,)*) {
            fn collect_ids(ids: &mut Vec<TypeId>) {
                $(<$name>::collect_ids(ids);)*
            }
        }
    }
}

all_tuples!(tuple_spec);
