//! Turns a parsed [`PHost`] into the final items: readers first, then the
//! equality and hash impls, then the shape.

use std::collections::HashSet;

use equivalence_core::{
    DeriveError, ReaderOrigin, ReaderPlan, SpecifierForm, Visibility, normalize, plan_reader,
};
use proc_macro2::{Delimiter, Group, Ident, Span, TokenStream, TokenTree};
use quote::quote;

use crate::parse::{Diagnostic, MethodRef, PHost, PImplItem, PItem};
use crate::tokens::{name_to_ident, unraw};

/// A method of the host as derivation sees it.
struct MethodEntry {
    name: String,
    visibility: Visibility,
    /// `None` for synthesized readers.
    at: Option<MethodRef>,
}

/// One canonical attribute after the accessor stage.
struct AttrPlan {
    name: String,
    ident: Ident,
    form: SpecifierForm,
    declared: Visibility,
    reader: Visibility,
    origin: ReaderOrigin,
}

struct Accessors {
    attrs: Vec<AttrPlan>,
    table: Vec<MethodEntry>,
    raised: HashSet<MethodRef>,
    synthesized: Vec<TokenStream>,
}

/// Expands a parsed block into the items that replace it.
pub(crate) fn expand(host: PHost) -> Result<TokenStream, Diagnostic> {
    let accessors = plan_accessors(&host)?;

    let mut out = TokenStream::new();
    for (index, item) in host.items.iter().enumerate() {
        match item {
            PItem::Struct(tokens) | PItem::Other(tokens) => out.extend(tokens.clone()),
            PItem::Impl(imp) => {
                let mut body = TokenStream::new();
                for (i, member) in imp.items.iter().enumerate() {
                    match member {
                        PImplItem::Method(method)
                            if accessors.raised.contains(&MethodRef { item: index, index: i }) =>
                        {
                            body.extend(method.with_crate_visibility());
                        }
                        PImplItem::Method(method) => body.extend(method.tokens.iter().cloned()),
                        PImplItem::Other(tokens) => body.extend(tokens.clone()),
                    }
                }
                let mut group = Group::new(Delimiter::Brace, body);
                group.set_span(imp.body_span);
                out.extend(imp.head.clone());
                out.extend(core::iter::once(TokenTree::Group(group)));
            }
        }
    }

    let name = &host.name;
    if !accessors.synthesized.is_empty() {
        let readers = &accessors.synthesized;
        out.extend(quote! {
            impl #name {
                #(#readers)*
            }
        });
    }

    out.extend(equality_and_hash(&host, &accessors.attrs));
    out.extend(shape(&host, &accessors));
    Ok(out)
}

/// The accessor stage: every canonical name, in order, through
/// [`plan_reader`].
fn plan_accessors(host: &PHost) -> Result<Accessors, Diagnostic> {
    let span = host.directive.span;
    let canonical = normalize(host.directive.specs.iter().cloned()).map_err(|err| match err {
        DeriveError::InvalidArgument { reason } => {
            Diagnostic::new(format!("equivalence: {reason}"), span)
        }
    })?;

    let mut table: Vec<MethodEntry> = Vec::new();
    for (at, method) in host.methods() {
        if !table.iter().any(|m| m.name == method.name) {
            table.push(MethodEntry {
                name: method.name.clone(),
                visibility: method.visibility,
                at: Some(at),
            });
        }
    }

    let mut attrs = Vec::with_capacity(canonical.len());
    let mut raised = HashSet::new();
    let mut synthesized = Vec::new();

    for attr in &canonical {
        let name = unraw(&attr.name).to_string();
        let ident = name_to_ident(&name, span).map_err(|message| Diagnostic::new(message, span))?;

        let entry = table.iter_mut().find(|m| m.name == name);
        let declared = entry.as_ref().map_or(Visibility::Absent, |m| m.visibility);
        let plan = plan_reader(declared);
        match plan {
            ReaderPlan::Untouched => {}
            ReaderPlan::RaiseToProtected => {
                if let Some(entry) = entry {
                    entry.visibility = Visibility::Protected;
                    if let Some(at) = entry.at {
                        raised.insert(at);
                    }
                }
            }
            ReaderPlan::SynthesizeProtected => {
                let Some(field) = host.field(&name) else {
                    return Err(Diagnostic::new(
                        format!(
                            "no such member `{name}` on `{}`: it is neither a method nor a field",
                            host.name
                        ),
                        span,
                    ));
                };
                let field_ident = &field.ident;
                let ty = &field.ty;
                synthesized.push(quote! {
                    pub(crate) fn #ident(&self) -> &#ty {
                        &self.#field_ident
                    }
                });
                table.push(MethodEntry {
                    name: name.clone(),
                    visibility: Visibility::Protected,
                    at: None,
                });
            }
        }

        attrs.push(AttrPlan {
            name,
            ident,
            form: attr.form,
            declared,
            reader: plan.resulting_visibility(declared),
            origin: plan.origin(),
        });
    }

    Ok(Accessors {
        attrs,
        table,
        raised,
        synthesized,
    })
}

/// `PartialEq`, `Eq` and `Hash`, all reading the same attributes the same
/// way, so equal values always hash alike.
fn equality_and_hash(host: &PHost, attrs: &[AttrPlan]) -> TokenStream {
    let name = &host.name;
    let (mine, theirs): (Vec<_>, Vec<_>) = attrs
        .iter()
        .map(|attr| {
            let ident = &attr.ident;
            match attr.form {
                SpecifierForm::Field => (quote! { self.#ident }, quote! { other.#ident }),
                SpecifierForm::Method => (quote! { self.#ident() }, quote! { other.#ident() }),
            }
        })
        .unzip();

    quote! {
        #[automatically_derived]
        impl ::core::cmp::PartialEq for #name {
            fn eq(&self, other: &Self) -> bool {
                #(#mine == #theirs)&&*
            }
        }

        #[automatically_derived]
        impl ::core::cmp::Eq for #name {}

        #[automatically_derived]
        impl ::core::hash::Hash for #name {
            fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                #(::core::hash::Hash::hash(&#mine, state);)*
            }
        }
    }
}

fn variant(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

fn shape(host: &PHost, accessors: &Accessors) -> TokenStream {
    let name = &host.name;
    let krate = &host.crate_path;
    let type_name = name.to_string();
    let type_name = unraw(&type_name);

    let attributes = accessors.attrs.iter().map(|attr| {
        let attr_name = &attr.name;
        let form = variant(attr.form.variant_name());
        let declared = variant(attr.declared.variant_name());
        let reader = variant(attr.reader.variant_name());
        let origin = variant(attr.origin.variant_name());
        quote! {
            #krate::AttrShape {
                name: #attr_name,
                form: #krate::SpecifierForm::#form,
                declared: #krate::Visibility::#declared,
                reader: #krate::Visibility::#reader,
                origin: #krate::ReaderOrigin::#origin,
            }
        }
    });

    let methods = accessors.table.iter().map(|method| {
        let method_name = &method.name;
        let visibility = variant(method.visibility.variant_name());
        quote! {
            #krate::MethodShape {
                name: #method_name,
                visibility: #krate::Visibility::#visibility,
            }
        }
    });

    quote! {
        #[automatically_derived]
        impl #krate::Equivalence for #name {
            const SHAPE: &'static #krate::Shape = &#krate::Shape {
                type_name: #type_name,
                attributes: &[#(#attributes),*],
                methods: &[#(#methods),*],
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_define;

    fn expand_str(input: TokenStream) -> String {
        let host = match parse_define(input) {
            Ok(host) => host,
            Err(d) => panic!("unexpected diagnostic: {}", d.message),
        };
        match expand(host) {
            Ok(tokens) => tokens.to_string(),
            Err(d) => panic!("unexpected diagnostic: {}", d.message),
        }
    }

    fn expand_err(input: TokenStream) -> String {
        match parse_define(input).and_then(expand) {
            Ok(tokens) => panic!("expected a diagnostic, got {tokens}"),
            Err(d) => d.message,
        }
    }

    #[equivalence_testhelpers::test]
    fn point_reads_fields_on_both_sides() {
        let out = expand_str(quote! {
            struct Point { x: i32, y: i32 }
            impl Point { equivalence!(@x, @y); }
        });
        assert!(out.contains("self . x == other . x && self . y == other . y"), "{out}");
        assert!(out.contains(":: core :: hash :: Hash :: hash (& self . x , state) ;"));
        assert!(out.contains(":: core :: hash :: Hash :: hash (& self . y , state) ;"));
        assert!(out.contains("impl :: core :: cmp :: Eq for Point"));
        assert!(out.contains("impl :: equivalence :: Equivalence for Point"));
        assert!(out.contains("form : :: equivalence :: SpecifierForm :: Field"), "{out}");
        assert!(out.contains("declared : :: equivalence :: Visibility :: Absent"));
        assert!(out.contains("origin : :: equivalence :: ReaderOrigin :: Synthesized"));
    }

    #[equivalence_testhelpers::test]
    fn absent_readers_are_synthesized_protected() {
        let out = expand_str(quote! {
            struct Point { x: i32, y: Vec<u8> }
            impl Point { equivalence!(@x, y); }
        });
        assert!(out.contains("pub (crate) fn x (& self) -> & i32 { & self . x }"), "{out}");
        assert!(out.contains("pub (crate) fn y (& self) -> & Vec < u8 > { & self . y }"));
        assert!(out.contains("self . y () == other . y ()"));
        assert!(out.contains("origin : :: equivalence :: ReaderOrigin :: Synthesized"));
    }

    #[equivalence_testhelpers::test]
    fn private_readers_are_raised_in_place() {
        let out = expand_str(quote! {
            struct Secretive { var: u8 }
            impl Secretive {
                equivalence!(@var);
                fn var(&self) -> &str { "zomg" }
            }
        });
        assert!(out.contains("pub (crate) fn var (& self) -> & str { \"zomg\" }"), "{out}");
        // no second reader
        assert_eq!(out.matches("fn var").count(), 1);
        assert!(out.contains("declared : :: equivalence :: Visibility :: Private"));
        assert!(out.contains("reader : :: equivalence :: Visibility :: Protected"));
        assert!(out.contains("origin : :: equivalence :: ReaderOrigin :: Raised"));
    }

    #[equivalence_testhelpers::test]
    fn accessible_readers_are_untouched() {
        let input = quote! {
            struct Open { a: u8, b: u8 }
            impl Open {
                equivalence!(a, b);
                pub fn a(&self) -> u8 { self.a }
                pub(super) fn b(&self) -> u8 { self.b }
            }
        };
        let out = expand_str(input);
        assert!(out.contains("pub fn a (& self) -> u8 { self . a }"), "{out}");
        assert!(out.contains("pub (super) fn b (& self) -> u8 { self . b }"));
        assert!(!out.contains("pub (crate)"));
    }

    #[equivalence_testhelpers::test]
    fn duplicates_synthesize_once() {
        let out = expand_str(quote! {
            struct Twice { x: i32 }
            impl Twice { equivalence!(@x, x, "@x"); }
        });
        assert_eq!(out.matches("fn x").count(), 1, "{out}");
        assert_eq!(out.matches("Hash :: hash (&").count(), 3);
    }

    #[equivalence_testhelpers::test]
    fn keywords_are_raw_in_code_and_plain_in_the_shape() {
        let out = expand_str(quote! {
            struct Tagged { r#type: String }
            impl Tagged { equivalence!(r#type, "@type"); }
        });
        assert!(out.contains("fn r#type (& self) -> & String"), "{out}");
        assert!(out.contains("self . r#type () == other . r#type ()"));
        assert!(out.contains("self . r#type == other . r#type"));
        assert!(out.contains("name : \"type\""));
    }

    #[equivalence_testhelpers::test]
    fn crate_path_is_honored() {
        let out = expand_str(quote! {
            #[equivalence(crate_path = crate::eq)]
            struct Id { value: u64 }
            impl Id { equivalence!(@value); }
        });
        assert!(out.contains("impl crate :: eq :: Equivalence for Id"), "{out}");
        assert!(!out.contains(":: equivalence ::"));
    }

    #[equivalence_testhelpers::test]
    fn empty_directive_is_an_invalid_argument() {
        let message = expand_err(quote! {
            struct Nothing { value: u8 }
            impl Nothing { equivalence!(); }
        });
        assert_eq!(message, "equivalence: at least one attribute is required");
    }

    #[equivalence_testhelpers::test]
    fn unknown_names_cannot_be_synthesized() {
        let message = expand_err(quote! {
            struct Point { x: i32 }
            impl Point { equivalence!(z); }
        });
        assert!(message.starts_with("no such member `z` on `Point`"), "{message}");
    }

    #[equivalence_testhelpers::test]
    fn method_table_lists_synthesized_readers_last() {
        let out = expand_str(quote! {
            struct Point { x: i32, y: i32 }
            impl Point {
                equivalence!(@x, y);
                pub fn new(x: i32, y: i32) -> Self { Self { x, y } }
                fn y(&self) -> i32 { self.y }
            }
        });
        let methods = &out[out.find("methods :").unwrap()..];
        let new = methods.find("name : \"new\"").unwrap();
        let y = methods.find("name : \"y\"").unwrap();
        let x = methods.find("name : \"x\"").unwrap();
        assert!(new < y && y < x, "{methods}");
    }
}
