//! Process-wide identity for component types.
//!
//! Each Rust type that is ever stored gets a dense [`TypeId`] the first time it is seen.
//! Dense ids sort cheaply and index flat tables, which is what [`Spec`](super::Spec) relies
//! on. The mapping is process-wide, so every registry in the process agrees on it.

use std::{
    any::TypeId as StdTypeId,
    fmt,
    mem,
    sync::{
        LazyLock, PoisonError, RwLock,
        atomic::{AtomicU32, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};

/// The dense identifier of a registered type.
///
/// Identifiers start at zero and are never reissued. Equal only for the same type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the id as an index into a flat table.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TypeId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the registry remembers about a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    id: TypeId,
    rust: StdTypeId,
    name: &'static str,
    size: usize,
    align: usize,
}

impl TypeInfo {
    fn of<T: 'static>(id: TypeId) -> Self {
        Self {
            id,
            rust: StdTypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Get the standard library id of the type.
    #[inline]
    pub fn type_id(&self) -> StdTypeId {
        self.rust
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the size of one value in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }
}

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

/// A thread-safe mapping from Rust types to dense [`TypeId`]s.
///
/// Lookups of known types only touch one `DashMap` shard. The first registration of a type
/// also takes the write lock of the info table, which is indexed by id.
#[derive(Default)]
pub struct TypeRegistry {
    ids: DashMap<StdTypeId, TypeId>,
    infos: RwLock<Vec<Option<TypeInfo>>>,
    next: AtomicU32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the registry shared by the whole process.
    #[inline]
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Get the id of `T`, registering it on first use.
    pub fn register<T: 'static>(&self) -> TypeId {
        let rust = StdTypeId::of::<T>();
        if let Some(known) = self.ids.get(&rust) {
            return *known;
        }

        // The entry holds the shard lock, so concurrent first registrations of `T` agree.
        match self.ids.entry(rust) {
            Entry::Occupied(known) => *known.get(),
            Entry::Vacant(slot) => {
                let id = TypeId(self.next.fetch_add(1, Ordering::Relaxed));
                self.record(TypeInfo::of::<T>(id));
                log::trace!("registered {} as {id}", std::any::type_name::<T>());
                *slot.insert(id)
            }
        }
    }

    /// Get the id of `T` if it was registered.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<TypeId> {
        self.ids.get(&StdTypeId::of::<T>()).map(|id| *id)
    }

    pub fn info(&self, id: TypeId) -> Option<TypeInfo> {
        let infos = self.infos.read().unwrap_or_else(PoisonError::into_inner);
        infos.get(id.index()).copied().flatten()
    }

    /// Get the readable name of `id`, or `"<unregistered>"`.
    pub fn name(&self, id: TypeId) -> &'static str {
        self.info(id).map_or("<unregistered>", |info| info.name)
    }

    /// Get the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn record(&self, info: TypeInfo) {
        let mut infos = self.infos.write().unwrap_or_else(PoisonError::into_inner);
        let index = info.id.index();
        if infos.len() <= index {
            infos.resize(index + 1, None);
        }
        infos[index] = Some(info);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    struct Mass(#[allow(dead_code)] f64);
    struct Charge;
    struct Spin;

    #[test]
    fn same_type_same_id() {
        // Given
        let registry = TypeRegistry::new();

        // When
        let mass = registry.register::<Mass>();
        let charge = registry.register::<Charge>();

        // Then
        assert_eq!((mass, charge), (TypeId::new(0), TypeId::new(1)));
        assert_eq!(registry.register::<Mass>(), mass);
        assert_eq!(registry.get::<Charge>(), Some(charge));
        assert_eq!(registry.get::<Spin>(), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn info_records_layout() {
        // Given
        let registry = TypeRegistry::new();
        registry.register::<Charge>();
        let id = registry.register::<Mass>();

        // When
        let info = registry.info(id).unwrap();

        // Then
        assert_eq!(info.id(), id);
        assert_eq!(info.type_id(), StdTypeId::of::<Mass>());
        assert_eq!((info.size(), info.align()), (8, mem::align_of::<f64>()));
        assert!(info.name().ends_with("Mass"));
        assert_eq!(registry.name(TypeId::new(40)), "<unregistered>");
        assert_eq!(id.to_string(), "#1");
    }

    #[test]
    fn threads_agree_on_ids() {
        // Given
        let registry = Arc::new(TypeRegistry::new());

        // When
        let ids: Vec<TypeId> = (0..12)
            .map(|n| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || match n % 3 {
                    0 => registry.register::<Mass>(),
                    1 => registry.register::<Charge>(),
                    _ => registry.register::<Spin>(),
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        // Then
        for (n, id) in ids.iter().enumerate() {
            assert_eq!(*id, ids[n % 3]);
            assert_eq!(registry.info(*id).map(|info| info.id()), Some(*id));
        }
        assert_eq!(registry.len(), 3);
    }
}
