//! `#[derive(MarkdownSchema)]` for docgraph-codec.
//!
//! The derive builds the type's `SchemaDescriptor` (once, behind a
//! `OnceLock`) and the `to_record`/`from_record` pair moving field values in
//! and out of a `Record`. Field kinds are inferred from the written type:
//!
//! ```text
//! String, bool, integers, Uuid, DateTime  -> scalar
//! Option<T>                               -> optional T
//! Vec<scalar>                             -> scalar array
//! Vec<T>                                  -> object array
//! anything else                           -> nested object
//! ```
//!
//! `#[markdown(scalar)]` / `#[markdown(object)]` override the inference, e.g.
//! for enums implementing `ScalarValue`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod expand;
mod types;

#[proc_macro_derive(MarkdownSchema, attributes(markdown))]
pub fn derive_markdown_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::derive(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
