use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match expand(&ast) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(ast: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let owner = owner_field(ast)?;

    let body = match owner {
        Some(field) => quote! {
            #[inline]
            fn attach(&mut self, owner: ::colony_ecs::ecs::Entity) {
                self.#field = ::core::option::Option::Some(owner);
            }

            #[inline]
            fn detach(&mut self) {
                self.#field = ::core::option::Option::None;
            }

            #[inline]
            fn owner(&self) -> ::core::option::Option<::colony_ecs::ecs::Entity> {
                self.#field
            }
        },
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::colony_ecs::ecs::Component for #struct_name #ty_generics #where_clause {
            #body
        }
    })
}

/// Find the single field tagged `#[component(owner)]`, if any.
fn owner_field(ast: &DeriveInput) -> syn::Result<Option<TokenStream2>> {
    let fields = match &ast.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) | Data::Union(_) => return Ok(None),
    };

    let mut found: Option<TokenStream2> = None;
    let iter: Box<dyn Iterator<Item = &syn::Field>> = match fields {
        Fields::Named(named) => Box::new(named.named.iter()),
        Fields::Unnamed(unnamed) => Box::new(unnamed.unnamed.iter()),
        Fields::Unit => return Ok(None),
    };

    for (index, field) in iter.enumerate() {
        let mut is_owner = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("component") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("owner") {
                    is_owner = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported component attribute, expected `owner`"))
                }
            })?;
        }

        if !is_owner {
            continue;
        }

        if found.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "only one field may be marked #[component(owner)]",
            ));
        }

        found = Some(match &field.ident {
            Some(ident) => quote! { #ident },
            None => {
                let index = Index::from(index);
                quote! { #index }
            }
        });
    }

    Ok(found)
}
