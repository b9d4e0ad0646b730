use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct UntilFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct UntilBody {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct Body {
        items: BraceGroup,
    }

    struct TestFn {
        until_fn: UntilFn, _fn: KFn, name: Ident,
        until_body: UntilBody, body: Body
    }
}

impl quote::ToTokens for UntilFn {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for UntilBody {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Body {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        tokens.extend(self.items.0.stream())
    }
}

/// `#[test]` that calls `equivalence_testhelpers::setup()` first.
///
/// ```ignore
/// #[equivalence_testhelpers::test]
/// fn points_compare_by_value() {
///     // tracing output from derivation shows up here
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut i = item.to_token_iter();
    let decl = match i.parse::<TestFn>() {
        Ok(decl) => decl,
        Err(e) => {
            let msg = format!("equivalence_testhelpers::test expects a function: {e}");
            return quote::quote! { compile_error!(#msg); }.into();
        }
    };

    let TestFn {
        until_fn,
        _fn,
        name,
        until_body,
        body,
    } = decl;

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #until_fn fn #name #until_body {
            ::equivalence_testhelpers::setup();

            #body
        }
    }
    .into()
}
