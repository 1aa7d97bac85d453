use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Ident, ItemFn, LitStr, parse_macro_input};

/// Implementation of the `#[assembly("name")]` attribute macro.
///
/// Leaves the function unchanged and appends a
/// `#[::joinery_core::linkme::distributed_slice]` static that places it in
/// `::joinery_core::ASSEMBLIES`.
pub fn assembly(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let fn_name = &func.sig.ident;

    let name = if attr.is_empty() {
        LitStr::new(&fn_name.to_string(), fn_name.span())
    } else {
        parse_macro_input!(attr as LitStr)
    };

    if name.value().trim().is_empty() {
        return syn::Error::new(name.span(), "assembly name cannot be empty")
            .into_compile_error()
            .into();
    }
    if let Some(asyncness) = &func.sig.asyncness {
        return syn::Error::new(asyncness.span, "#[assembly] functions cannot be async")
            .into_compile_error()
            .into();
    }
    if func.sig.inputs.len() != 1 || !func.sig.generics.params.is_empty() {
        return syn::Error::new(
            fn_name.span(),
            "#[assembly] expects `fn(asm: &mut AssemblyBuilder)`",
        )
        .into_compile_error()
        .into();
    }

    let static_name = Ident::new(
        &format!("_JOINERY_ASSEMBLY_{}", fn_name.to_string().to_uppercase()),
        Span::call_site(),
    );

    quote! {
        #func

        #[::joinery_core::linkme::distributed_slice(::joinery_core::ASSEMBLIES)]
        #[linkme(crate = ::joinery_core::linkme)]
        static #static_name: ::joinery_core::AssemblyDescriptor =
            ::joinery_core::AssemblyDescriptor {
                name: #name,
                register: #fn_name,
            };
    }
    .into()
}
