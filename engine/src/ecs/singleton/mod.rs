//! Singleton types for the ECS.
//!
//! A singleton exists at most once per registry, independent of any entity.
//!
//! | Aspect | Singleton | Component |
//! |--------|-----------|-----------|
//! | Cardinality | One per type per registry | One per type per entity |
//! | Access | Directly by type | Through `get` or `range` |
//! | Storage | A type-keyed map | A colony per type |
//!
//! ```rust
//! use colony_ecs::ecs::{Registry, Singleton};
//!
//! #[derive(Singleton)]
//! struct Score(u32);
//!
//! let mut registry = Registry::new();
//! registry.insert_singleton(Score(0)).unwrap();
//! registry.singleton_mut::<Score>().unwrap().0 += 10;
//! assert_eq!(registry.singleton::<Score>().unwrap().0, 10);
//! ```

/// A trait for one-per-registry types.
///
/// Use `#[derive(Singleton)]` to implement it.
pub trait Singleton: 'static {}
