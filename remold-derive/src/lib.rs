//! Derive macros for remold
//!
//! This crate provides `#[derive(Reflect)]`, which compiles a declared
//! Rust type into remold's shape representation at reflection time.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derives the `Reflect` trait for a struct or enum.
///
/// # Supported forms
///
/// - Structs with named fields become a composite shape; field order is
///   declaration order. `#[remold(default)]` on a field records the field
///   type's `Default` value as the declared default (the type must also
///   implement `serde::Serialize`).
/// - Enums with only unit variants become an enum shape matched by
///   variant name.
/// - Enums marked `#[remold(union)]` whose variants each hold exactly one
///   unnamed field become a union shape; alternatives are tried in
///   declaration order. Pair with serde's `#[serde(untagged)]` so
///   instantiation resolves the same way.
///
/// # Example
///
/// ```ignore
/// use remold::Reflect;
///
/// #[derive(Reflect)]
/// struct User {
///     name: String,
///     age: u32,
///     email: Option<String>,
/// }
///
/// let shape = remold::reflect::<User>().unwrap();
/// ```
#[proc_macro_derive(Reflect, attributes(remold))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data_struct) => generate_struct_reflect(name, data_struct),
        Data::Enum(data_enum) => {
            if has_remold_flag(&input.attrs, "union") {
                generate_union_reflect(name, data_enum)
            } else {
                generate_enum_reflect(name, data_enum)
            }
        }
        Data::Union(_) => {
            return syn::Error::new_spanned(input, "Reflect cannot be derived for unions")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        impl #impl_generics ::remold::shape::Reflect for #name #ty_generics #where_clause {
            fn reflect() -> ::std::result::Result<
                ::remold::shape::TypeShape,
                ::remold::error::SchemaError,
            > {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

fn generate_struct_reflect(name: &syn::Ident, data: &syn::DataStruct) -> proc_macro2::TokenStream {
    let name_str = name.to_string();

    match &data.fields {
        Fields::Named(fields) => {
            let field_entries = fields.named.iter().map(|f| {
                let field_name = f.ident.as_ref().expect("named field").to_string();
                let field_type = &f.ty;

                let descriptor = quote! {
                    ::remold::shape::FieldDescriptor::new(
                        #field_name,
                        <#field_type as ::remold::shape::Reflect>::reflect()?
                    )
                };

                if has_remold_flag(&f.attrs, "default") {
                    quote! {
                        #descriptor.with_default(
                            ::remold::shape::default_value::<#field_type>(#field_name)?
                        )
                    }
                } else {
                    descriptor
                }
            });

            quote! {
                ::remold::shape::reflect_composite(#name_str, || {
                    Ok(vec![#(#field_entries),*])
                })
            }
        }
        Fields::Unnamed(_) => syn::Error::new_spanned(
            &data.fields,
            "Reflect supports structs with named fields only",
        )
        .to_compile_error(),
        Fields::Unit => syn::Error::new_spanned(
            name,
            "Reflect does not support unit structs",
        )
        .to_compile_error(),
    }
}

fn generate_enum_reflect(name: &syn::Ident, data: &syn::DataEnum) -> proc_macro2::TokenStream {
    let name_str = name.to_string();

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return syn::Error::new_spanned(
                variant,
                "Reflect enums support unit variants only; mark alternatives with #[remold(union)]",
            )
            .to_compile_error();
        }
    }

    let values = data.variants.iter().map(|v| v.ident.to_string());

    quote! {
        Ok(::remold::shape::TypeShape::Enum {
            name: #name_str.to_string(),
            values: vec![#(#values.to_string()),*],
        })
    }
}

fn generate_union_reflect(name: &syn::Ident, data: &syn::DataEnum) -> proc_macro2::TokenStream {
    if data.variants.len() < 2 {
        return syn::Error::new_spanned(name, "union enums need at least two variants")
            .to_compile_error();
    }

    let mut alternatives = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                alternatives.push(&fields.unnamed[0].ty);
            }
            _ => {
                return syn::Error::new_spanned(
                    variant,
                    "union variants must have exactly one unnamed field",
                )
                .to_compile_error();
            }
        }
    }

    quote! {
        Ok(::remold::shape::TypeShape::Union(vec![
            #(<#alternatives as ::remold::shape::Reflect>::reflect()?),*
        ]))
    }
}

/// Check for a `#[remold(<flag>)]` marker attribute.
fn has_remold_flag(attrs: &[syn::Attribute], flag: &str) -> bool {
    attrs.iter().any(|attr| {
        if attr.path().is_ident("remold") {
            if let Ok(meta_list) = attr.meta.require_list() {
                return meta_list.tokens.to_string().trim() == flag;
            }
        }
        false
    })
}
