//! Component types shared by the benchmarks, sized like typical game data.

use colony_ecs::ecs::{Component, Singleton};

/// 3D position (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Euler rotation (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4x4 transformation matrix (64 bytes).
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Generic payload for fragmentation tests.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Data {
    pub value: f32,
}

/// Tracks the entity it is attached to.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Anchor {
    #[component(owner)]
    pub owner: Option<colony_ecs::ecs::Entity>,
}

/// Frame delta shared by every system.
#[derive(Singleton)]
pub struct DeltaTime(pub f32);

macro_rules! markers {
    ($($name:ident),*) => {
        $(
            #[derive(Component, Clone, Copy, Debug, Default)]
            pub struct $name;
        )*
    };
}

// Zero-sized markers used to split entities over many archetypes.
markers!(
    MarkerA, MarkerB, MarkerC, MarkerD, MarkerE, MarkerF, MarkerG, MarkerH, MarkerI, MarkerJ,
    MarkerK, MarkerL, MarkerM, MarkerN, MarkerO, MarkerP
);
