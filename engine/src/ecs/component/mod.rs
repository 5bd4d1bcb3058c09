//! Component management for the ECS.
//!
//! Components are the typed records attached to entities. Every component type gets a dense
//! process-wide [`TypeId`] from the [`TypeRegistry`], and a set of component types is
//! summarised by a [`Spec`]: the sorted, duplicate-free sequence of those identifiers.
//!
//! ## Architecture
//!
//! - [`Component`]: The trait that all component types must implement
//! - [`TypeId`] / [`TypeInfo`]: Identity and metadata of a registered type
//! - [`TypeRegistry`]: Thread-safe registration and lookup of types
//! - [`Spec`]: The archetype key describing a set of component types
//! - [`Set`]: A bundle of component values that can be attached to an entity
//!
//! ## Back-referencing components
//!
//! A component may store the handle of the entity that owns it. Deriving `Component` with a
//! field marked `#[component(owner)]` implements [`Component::attach`] and
//! [`Component::owner`] for that field:
//!
//! ```rust
//! use colony_ecs::ecs::{Component, Entity};
//!
//! #[derive(Component)]
//! struct Collider {
//!     radius: f32,
//!     #[component(owner)]
//!     owner: Option<Entity>,
//! }
//! ```

mod registry;
mod set;
mod spec;

pub use registry::{TypeId, TypeInfo, TypeRegistry};
pub use set::{Set, Target};
pub use spec::{IntoSpec, Spec};

use crate::ecs::entity::Entity;

/// A trait representing a component in the ECS.
///
/// Components must be `'static`; they are owned exclusively by their slot inside the colony
/// dedicated to their type. Use `#[derive(Component)]` to implement it.
pub trait Component: 'static + Sized {
    /// Called by the registry once the component is attached to `owner`.
    #[inline]
    fn attach(&mut self, _owner: Entity) {}

    /// Called by the registry when the component is removed from its owner.
    #[inline]
    fn detach(&mut self) {}

    /// The entity this component is attached to, for back-referencing components.
    #[inline]
    fn owner(&self) -> Option<Entity> {
        None
    }
}

/// Get the process-wide identifier for component type `C`, registering it on first use.
#[inline]
pub fn id_of<C: 'static>() -> TypeId {
    TypeRegistry::global().register::<C>()
}

/// Get the readable name of component type `C`.
#[inline]
pub fn name_of<C: 'static>() -> &'static str {
    std::any::type_name::<C>()
}
