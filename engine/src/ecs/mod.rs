pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod registry;
pub mod singleton;
pub mod storage;
pub mod view;
pub(crate) mod util;

pub use component::{Component, Spec, TypeId};
pub use entity::Entity;
pub use error::{Error, Result};
pub use query::Query;
pub use registry::{Config, Registry};
pub use singleton::Singleton;
pub use storage::{Colony, Slab};
pub use view::View;

pub use colony_macros::{Component, Singleton};
