//! `#[derive(Configurable)]` implementation.
//!
//! The generated `from_properties` reads one property per field, in field
//! order, and lets type inference pick the target type of each read.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, spanned::Spanned};

// ============================================================================
// Field attributes
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Required,
    Default,
    Optional,
    Dependency,
    Dependencies,
    Skip,
}

impl Access {
    fn keyword(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Default => "default",
            Self::Optional => "optional",
            Self::Dependency => "dependency",
            Self::Dependencies => "dependencies",
            Self::Skip => "skip",
        }
    }
}

struct FieldAttrs {
    access: Access,
    name: Option<LitStr>,
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs {
        access: Access::Required,
        name: None,
    };

    for attr in attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let access = if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?);
                return Ok(());
            } else if meta.path.is_ident("default") {
                Access::Default
            } else if meta.path.is_ident("optional") {
                Access::Optional
            } else if meta.path.is_ident("dependency") {
                Access::Dependency
            } else if meta.path.is_ident("dependencies") {
                Access::Dependencies
            } else if meta.path.is_ident("skip") {
                Access::Skip
            } else {
                return Err(meta.error(
                    "unknown property key, expected one of: name, default, optional, \
                     dependency, dependencies, skip",
                ));
            };

            if result.access != Access::Required {
                return Err(meta.error(format!(
                    "`{}` conflicts with `{}`",
                    access.keyword(),
                    result.access.keyword()
                )));
            }
            result.access = access;
            Ok(())
        })?;
    }

    Ok(result)
}

// ============================================================================
// Code generation
// ============================================================================

pub fn derive_configurable(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Configurable can only be derived for structs",
        ));
    };

    let body = match &data.fields {
        Fields::Named(named) => {
            let mut inits = Vec::with_capacity(named.named.len());
            for field in &named.named {
                let Some(ident) = &field.ident else {
                    continue;
                };
                let attrs = parse_field_attrs(&field.attrs)?;
                let property = attrs
                    .name
                    .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

                let read = match attrs.access {
                    Access::Required => quote!(props.value(#property)?),
                    Access::Default => quote!(props.value_or_default(#property)?),
                    Access::Optional => quote!(props.optional(#property)?),
                    Access::Dependency => quote!(props.dependency(#property)?),
                    Access::Dependencies => quote!(props.dependencies(#property)?),
                    Access::Skip => quote!(::core::default::Default::default()),
                };
                inits.push(quote!(#ident: #read));
            }
            quote!(Self { #(#inits),* })
        }
        Fields::Unit => quote!(Self),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                data.fields.span(),
                "Configurable needs named fields to map properties",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::joinery_core::Configurable for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn from_properties(
                props: &mut ::joinery_core::PropertyReader<'_>,
            ) -> ::joinery_core::BuildResult<Self> {
                ::core::result::Result::Ok(#body)
            }
        }
    })
}
