//! Small helpers on raw tokens and names.

use proc_macro2::{Delimiter, Ident, Span, TokenStream, TokenTree};

/// Flattens `Delimiter::None` groups, which `macro_rules!` wraps around
/// captured fragments such as `$vis:vis`.
pub(crate) fn flatten_transparent_groups(input: TokenStream) -> TokenStream {
    input
        .into_iter()
        .flat_map(|tt| match tt {
            TokenTree::Group(group) if group.delimiter() == Delimiter::None => {
                flatten_transparent_groups(group.stream())
            }
            TokenTree::Group(group) => {
                let mut new_group =
                    proc_macro2::Group::new(group.delimiter(), flatten_transparent_groups(group.stream()));
                new_group.set_span(group.span());
                core::iter::once(TokenTree::Group(new_group)).collect()
            }
            other => core::iter::once(other).collect(),
        })
        .collect()
}

/// A name as it is reported and looked up: without any `r#` prefix.
pub(crate) fn unraw(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Turns a canonical name into an identifier, raw when it is a keyword.
pub(crate) fn name_to_ident(name: &str, span: Span) -> Result<Ident, String> {
    let name = unraw(name);
    if matches!(name, "self" | "Self" | "super" | "crate" | "_") {
        return Err(format!("`{name}` cannot name an attribute"));
    }
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first == '_' || first.is_alphabetic()) && chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        None => false,
    };
    if !valid {
        return Err(format!("`{name}` is not a valid identifier"));
    }
    if KEYWORDS.contains(&name) {
        Ok(Ident::new_raw(name, span))
    } else {
        Ok(Ident::new(name, span))
    }
}

/// `compile_error!` with a span, the way diagnostics leave this crate.
pub(crate) fn compile_error(message: &str, span: Span) -> TokenStream {
    quote::quote_spanned! { span=> ::core::compile_error! { #message } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[equivalence_testhelpers::test]
    fn keywords_become_raw_identifiers() {
        let span = Span::call_site();
        assert_eq!(name_to_ident("type", span).unwrap().to_string(), "r#type");
        assert_eq!(name_to_ident("r#type", span).unwrap().to_string(), "r#type");
        assert_eq!(name_to_ident("alias", span).unwrap().to_string(), "alias");
        assert!(name_to_ident("eql?", span).is_err());
        assert!(name_to_ident("self", span).is_err());
        assert!(name_to_ident("", span).is_err());
    }
}
