//! Error type shared by every fallible operation in the ECS.

use thiserror::Error;

use crate::ecs::entity::Entity;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by slabs, colonies, views and the registry.
///
/// All errors are reported synchronously at the point of violation; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Insert into a slab with no free slot.
    #[error("slab is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// A slab position outside `[0, capacity)`.
    #[error("position {position} is out of range (capacity {capacity})")]
    OutOfRange { position: usize, capacity: usize },

    /// An index or position that is not currently occupied.
    #[error("invalid index {index}")]
    InvalidIndex { index: usize },

    #[error("no such entity: {0}")]
    NoSuchEntity(Entity),

    #[error("entity {entity} has no component {component}")]
    NoSuchComponent {
        entity: Entity,
        component: &'static str,
    },

    /// The component type is already present, or was named twice in one set.
    #[error("duplicate component {component}")]
    DuplicateComponent { component: &'static str },

    #[error("no such singleton: {singleton}")]
    NoSuchSingleton { singleton: &'static str },

    #[error("singleton exists: {singleton}")]
    SingletonExists { singleton: &'static str },

    /// A view entry without a full stride of slots behind it.
    #[error("view corruption at entity {entity}")]
    ViewCorruption { entity: Entity },

    #[error("entity {entity} not found in view")]
    EntityNotFound { entity: Entity },

    /// The component does not carry an owner back-reference, or it was never attached.
    #[error("component {component} does not record an owner")]
    NotOwned { component: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        // Given
        let entity = Entity::from_raw(7);

        // Then
        assert_eq!(Error::NoSuchEntity(entity).to_string(), "no such entity: 7");
        assert_eq!(
            Error::NoSuchComponent {
                entity,
                component: "Position"
            }
            .to_string(),
            "entity 7 has no component Position"
        );
        assert_eq!(
            Error::CapacityExceeded { capacity: 32 }.to_string(),
            "slab is full (capacity 32)"
        );
    }
}
