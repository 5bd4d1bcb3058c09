use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_singleton(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // `::colony_ecs` resolves inside the crate through `extern crate self as colony_ecs;`.
    TokenStream::from(quote! {
        impl #impl_generics ::colony_ecs::ecs::Singleton for #struct_name #ty_generics #where_clause {
        }
    })
}
