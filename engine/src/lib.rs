//! An in-process store of typed components attached to opaque entity handles.
//!
//! Every component type lives in its own [`Colony`](ecs::storage::Colony), a growable sequence
//! of fixed-size slabs whose slots never move once handed out. The
//! [`Registry`](ecs::Registry) ties entities to their components and keeps a cache of
//! incrementally maintained views, one per distinct queried set of component types.
//!
//! ```rust
//! use colony_ecs::ecs::{Component, Registry};
//!
//! #[derive(Component, Debug, PartialEq)]
//! struct Position(f32, f32);
//!
//! #[derive(Component, Debug, PartialEq)]
//! struct Velocity(f32, f32);
//!
//! let mut registry = Registry::new();
//! let entity = registry.create((Position(0.0, 0.0), Velocity(1.0, 2.0))).unwrap();
//!
//! for (_, (pos, vel)) in registry.range::<(Position, Velocity)>().unwrap() {
//!     pos.0 += vel.0;
//!     pos.1 += vel.1;
//! }
//!
//! assert_eq!(registry.get::<Position>(entity).unwrap(), &Position(1.0, 2.0));
//! ```

// Lets the derive macros refer to `::colony_ecs` from inside this crate as well.
extern crate self as colony_ecs;

pub mod ecs;
