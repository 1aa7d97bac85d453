//! Procedural macros for the Joinery object-graph engine.
//!
//! - `#[derive(Configurable)]` builds a struct from the properties of a
//!   configured instance.
//! - `#[assembly("name")]` contributes a type-registration function to the
//!   link-time assembly list.
//!
//! ```rust,ignore
//! use joinery::prelude::*;
//!
//! #[derive(Configurable)]
//! pub struct ColorService {
//!     color: String,
//!     #[property(default)]
//!     shade: u8,
//!     #[property(dependency, name = "palette")]
//!     palette: Arc<dyn Palette>,
//! }
//!
//! #[assembly("widgets")]
//! fn widgets(asm: &mut AssemblyBuilder) {
//!     asm.contract::<dyn Service>("Service");
//!     asm.concrete::<ColorService>("ColorService").plugs::<dyn Service>(|c| c);
//! }
//! ```

mod assembly;
mod configurable;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Configurable` for a struct with named fields.
///
/// Each field is read from the property of the same name.  Field-level
/// `#[property(...)]` keys:
///
/// | Key | Reads |
/// |-----|-------|
/// | *(none)* | required literal (`PropertyReader::value`) |
/// | `default` | literal or `Default::default()` |
/// | `optional` | `Option<T>` literal |
/// | `dependency` | `Arc<C>`: reference, child or the default instance |
/// | `dependencies` | `Vec<Arc<C>>`: list of references or every instance |
/// | `skip` | not read, `Default::default()` |
/// | `name = "…"` | overrides the property name |
#[proc_macro_derive(Configurable, attributes(property))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match configurable::derive_configurable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Registers a `fn(&mut AssemblyBuilder)` as a link-time assembly.
///
/// `#[assembly("widgets")]` names the assembly explicitly; a bare
/// `#[assembly]` uses the function name.
#[proc_macro_attribute]
pub fn assembly(attr: TokenStream, item: TokenStream) -> TokenStream {
    assembly::assembly(attr, item)
}
