#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use proc_macro2::TokenStream;

mod expand;
mod parse;
mod tokens;

/// Expands a `define!` block.
///
/// The block holds one struct with named fields, any number of impl blocks,
/// and, inside one inherent impl of that struct, the directive:
///
/// ```text
/// define! {
///     pub struct Point { x: i32, y: i32 }
///
///     impl Point {
///         equivalence!(@x, @y);
///     }
/// }
/// ```
///
/// The output is the block itself, with private readers raised to
/// `pub(crate)`, missing readers added as `pub(crate)`, and `PartialEq`,
/// `Eq`, `Hash` and `Equivalence` implemented over the listed attributes.
/// Problems come back as a spanned `compile_error!`.
pub fn define(input: TokenStream) -> TokenStream {
    let input = tokens::flatten_transparent_groups(input);
    match parse::parse_define(input).and_then(expand::expand) {
        Ok(output) => output,
        Err(diagnostic) => tokens::compile_error(&diagnostic.message, diagnostic.span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[equivalence_testhelpers::test]
    fn errors_become_compile_errors() {
        let out = define(quote! {
            struct Nothing { value: u8 }
            impl Nothing { equivalence!(); }
        })
        .to_string();
        assert_eq!(
            out,
            ":: core :: compile_error ! { \"equivalence: at least one attribute is required\" }"
        );
    }

    #[equivalence_testhelpers::test]
    fn macro_rules_fragments_are_flattened() {
        let vis = proc_macro2::Group::new(proc_macro2::Delimiter::None, quote! { pub });
        let out = define(quote! {
            #vis struct Wrapped { value: u8 }
            impl Wrapped { equivalence!(@value); }
        })
        .to_string();
        assert!(out.starts_with("pub struct Wrapped"), "{out}");
    }
}
