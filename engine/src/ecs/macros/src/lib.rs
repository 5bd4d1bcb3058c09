mod component;
mod singleton;

use proc_macro::TokenStream;

/// Derive the `Component` trait.
///
/// A field marked `#[component(owner)]` (of type `Option<Entity>`) turns the component into a
/// back-referencing component: the registry writes the owning entity into it when the
/// component is attached.
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(item: TokenStream) -> TokenStream {
    component::derive_component(item)
}

#[proc_macro_derive(Singleton)]
pub fn derive_singleton(item: TokenStream) -> TokenStream {
    singleton::derive_singleton(item)
}
