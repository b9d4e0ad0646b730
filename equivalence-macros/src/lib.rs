#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Defines a struct whose equality and hash come from a list of attributes.
///
/// See the `equivalence` crate for the full syntax.
#[proc_macro]
pub fn define(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    equivalence_macros_impl::define(input.into()).into()
}
