use crate::{
    all_tuples,
    ecs::component::{Component, IntoSpec, TypeId, id_of},
};

/// Trait describing a target that component values from a [`Set`] are moved into.
pub trait Target {
    fn apply<C: Component>(&mut self, id: TypeId, value: C);
}

/// A set of component values to attach to one entity.
///
/// Sets are a single component, a tuple of sets, or the empty tuple. The values are moved
/// into the target one by one in declaration order, so the registry never needs to know the
/// concrete tuple type.
pub trait Set: IntoSpec + Sized + 'static {
    /// Move every component value in this set into `target`.
    fn apply<T: Target>(self, target: &mut T);
}

impl<C: Component> Set for C {
    fn apply<T: Target>(self, target: &mut T) {
        target.apply::<C>(id_of::<C>(), self);
    }
}

impl Set for () {
    fn apply<T: Target>(self, _target: &mut T) {}
}

macro_rules! tuple_set {
    ($($name: ident),*) => {
        impl<$($name: Set),*> Set for ($($name,)*) {
            fn apply<CT: Target>(self, target: &mut CT) {
                #[allow(non_snake_case)]
                let ( $($name,)* ) = self;
                $(<$name as Set>::apply($name, target);)*
            }
        }
    }
}

all_tuples!(tuple_set);
