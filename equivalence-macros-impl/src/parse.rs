//! Parsing a `define!` block into a [`PHost`].

use core::ops::Range;

use equivalence_core::{Specifier, Visibility};
use proc_macro2::{Delimiter, Ident, Span, TokenStream, TokenTree};
use quote::quote;
use unsynn::*;
// unsynn's prelude has a one-parameter `Result`
use core::result::Result;

use crate::tokens::unraw;

keyword! {
    KStruct = "struct";
    KEnum = "enum";
    KUnion = "union";
    KImpl = "impl";
    KTrait = "trait";
    KMod = "mod";
    KFn = "fn";
    KPub = "pub";
    KConst = "const";
    KAsync = "async";
    KUnsafe = "unsafe";
    KExtern = "extern";
}

operator! {
    FieldMarker = "@";
}

unsynn! {
    /// `pub`, `pub(crate)`, `pub(super)`, `pub(in path)`, `pub(self)`
    enum Vis {
        PubIn(Cons<KPub, ParenthesisGroup>),
        Pub(KPub),
    }

    /// An attribute: `#[...]`
    struct Attribute {
        _pound: Pound,
        _content: BracketGroup,
    }

    /// One item of a `define!` block or of an impl body, alternatives tried
    /// in order
    enum Item {
        Macro(MacroItem),
        Fn(FnItem),
        Block(BlockItem),
        Other(OtherItem),
    }

    /// `name!(...);`, `name![...];`, `name! {...}` or `macro_rules! name {...}`
    struct MacroItem {
        _attrs: Vec<Attribute>,
        path: MacroPath,
        _bang: Bang,
        name: Option<Ident>,
        body: MacroBody,
    }

    struct MacroPath {
        leading: Option<PathSep>,
        first: Ident,
        rest: Any<Cons<PathSep, Ident>>,
    }

    enum MacroBody {
        Braced(BraceGroup),
        Parens(Cons<ParenthesisGroup, Option<Semicolon>>),
        Brackets(Cons<BracketGroup, Option<Semicolon>>),
    }

    /// A function, with a body or ending in `;`
    struct FnItem {
        attrs: Vec<Attribute>,
        vis: Option<Vis>,
        _qualifiers: Any<FnQualifier>,
        _fn: KFn,
        name: Ident,
        _signature: Any<Cons<Except<ItemEnd>, TokenTree>>,
        _end: ItemEnd,
    }

    enum FnQualifier {
        Const(KConst),
        Async(KAsync),
        Unsafe(KUnsafe),
        Extern(Cons<KExtern, Option<Literal>>),
    }

    /// `struct`, `enum`, `union`, `impl`, `trait` or `mod`, up to its body
    struct BlockItem {
        _attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        _unsafe: Option<KUnsafe>,
        kind: BlockKind,
        _header: Any<Cons<Except<ItemEnd>, TokenTree>>,
        _end: ItemEnd,
    }

    enum BlockKind {
        Struct(KStruct),
        Enum(KEnum),
        Union(KUnion),
        Impl(KImpl),
        Trait(KTrait),
        Mod(KMod),
    }

    enum ItemEnd {
        Body(BraceGroup),
        Semi(Semicolon),
    }

    /// Anything else runs up to and including the next `;`
    struct OtherItem {
        _tokens: Any<Cons<Except<Semicolon>, TokenTree>>,
        _semi: Semicolon,
    }

    /// `struct Name { ... }`; generic parameters do not parse
    struct StructDecl {
        _attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        _kw: KStruct,
        name: Ident,
        body: BraceGroup,
    }

    /// One named field
    struct NamedField {
        _attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        name: Ident,
        _colon: Colon,
        ty: FieldType,
    }

    /// A field's type: everything up to the next comma outside `<...>`
    struct FieldType {
        _tokens: Many<Cons<Except<Comma>, AngleTokenTree>>,
    }

    /// A token tree that keeps `<...>` together and does not mistake the
    /// `>` of `->` for a closing bracket
    struct AngleTokenTree {
        _tree: Either<RArrow, Cons<Lt, Any<Cons<Except<Gt>, AngleTokenTree>>, Gt>, TokenTree>,
    }

    /// `impl Name { ... }`; trait impls and generic impls do not parse
    struct InherentImpl {
        _attrs: Vec<Attribute>,
        _kw: KImpl,
        self_ty: Ident,
        body: BraceGroup,
    }

    /// One argument of `equivalence!(...)`
    enum SpecToken {
        Field(Cons<FieldMarker, Ident>),
        Method(Ident),
        Text(Literal),
    }

    /// `crate_path = some::path`
    struct CratePathArg {
        key: Ident,
        _eq: Assign,
        path: Vec<TokenTree>,
    }
}

impl MacroItem {
    /// `equivalence!(...)`, with any delimiter.
    fn is_directive(&self) -> bool {
        self.path.leading.is_none()
            && self.path.rest.is_empty()
            && self.name.is_none()
            && self.path.first == "equivalence"
    }

    fn args(&self) -> TokenStream {
        match &self.body {
            MacroBody::Braced(group) => group.0.stream(),
            MacroBody::Parens(args) => args.first.0.stream(),
            MacroBody::Brackets(args) => args.first.0.stream(),
        }
    }
}

/// An item and the exact tokens it was parsed from.
struct RawItem {
    /// `None` for trailing tokens that make no item.
    item: Option<Item>,
    tokens: Vec<TokenTree>,
}

impl RawItem {
    fn is(&self, kind: fn(&BlockKind) -> bool) -> bool {
        matches!(&self.item, Some(Item::Block(block)) if kind(&block.kind))
    }

    fn is_struct(&self) -> bool {
        self.is(|kind| matches!(kind, BlockKind::Struct(_)))
    }

    fn is_impl(&self) -> bool {
        self.is(|kind| matches!(kind, BlockKind::Impl(_)))
    }
}

/// Splits a sequence of items, module level or inside an `impl`.
///
/// The grammar only finds the boundaries; each item keeps its original
/// tokens, spans and spacing included.
fn parse_items(stream: TokenStream) -> Vec<RawItem> {
    let mut source = stream.clone().into_iter();
    let mut iter = stream.to_token_iter();
    let mut items = Vec::new();
    loop {
        let start = iter.counter();
        let Ok(item) = iter.parse::<Item>() else {
            break;
        };
        let tokens = source.by_ref().take(iter.counter() - start).collect();
        items.push(RawItem {
            item: Some(item),
            tokens,
        });
    }
    let rest: Vec<TokenTree> = source.collect();
    if !rest.is_empty() {
        items.push(RawItem {
            item: None,
            tokens: rest,
        });
    }
    items
}

/// An error to be reported at `span`.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// The parsed contents of a `define!` block.
pub(crate) struct PHost {
    pub name: Ident,
    /// Path of the `equivalence` crate in generated code.
    pub crate_path: TokenStream,
    pub fields: Vec<PField>,
    /// Every item of the block, in order.
    pub items: Vec<PItem>,
    pub directive: PDirective,
}

impl PHost {
    pub fn field(&self, name: &str) -> Option<&PField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every method of the host, in declaration order, with its position.
    pub fn methods(&self) -> impl Iterator<Item = (MethodRef, &PMethod)> {
        self.items.iter().enumerate().flat_map(|(item, it)| {
            let methods: &[PImplItem] = match it {
                PItem::Impl(imp) => &imp.items,
                _ => &[],
            };
            methods.iter().enumerate().filter_map(move |(index, m)| match m {
                PImplItem::Method(method) => Some((MethodRef { item, index }, method)),
                PImplItem::Other(_) => None,
            })
        })
    }
}

pub(crate) struct PField {
    /// Field name without any `r#`.
    pub name: String,
    pub ident: Ident,
    pub ty: TokenStream,
}

pub(crate) enum PItem {
    /// The host struct, with `#[equivalence(..)]` removed.
    Struct(TokenStream),
    /// An inherent impl block of the host.
    Impl(PImpl),
    /// Anything else, passed through untouched.
    Other(TokenStream),
}

pub(crate) struct PImpl {
    /// Everything before the body: attributes and `impl Name`.
    pub head: TokenStream,
    pub body_span: Span,
    pub items: Vec<PImplItem>,
}

pub(crate) enum PImplItem {
    Method(PMethod),
    Other(TokenStream),
}

pub(crate) struct PMethod {
    /// Method name without any `r#`.
    pub name: String,
    pub visibility: Visibility,
    pub tokens: Vec<TokenTree>,
    /// Where the visibility sits in `tokens`, empty when there is none.
    vis_at: Range<usize>,
}

impl PMethod {
    fn new(decl: &FnItem, tokens: Vec<TokenTree>) -> Self {
        // `#` and `[...]` per attribute
        let start = decl.attrs.len() * 2;
        let len = match &decl.vis {
            None => 0,
            Some(Vis::Pub(_)) => 1,
            Some(Vis::PubIn(_)) => 2,
        };
        Self {
            name: unraw(&decl.name.to_string()).to_string(),
            visibility: visibility_of(decl.vis.as_ref()),
            tokens,
            vis_at: start..start + len,
        }
    }

    /// The method with its visibility rewritten to `pub(crate)`, attributes
    /// and doc comments kept.
    pub fn with_crate_visibility(&self) -> TokenStream {
        let mut out = to_stream(&self.tokens[..self.vis_at.start]);
        out.extend(quote! { pub(crate) });
        out.extend(self.tokens[self.vis_at.end..].iter().cloned());
        out
    }
}

/// Position of a method: index in [`PHost::items`], then in the impl body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MethodRef {
    pub item: usize,
    pub index: usize,
}

pub(crate) struct PDirective {
    pub specs: Vec<Specifier>,
    pub span: Span,
}

fn to_stream(tokens: &[TokenTree]) -> TokenStream {
    tokens.iter().cloned().collect()
}

fn span_of(tokens: &[TokenTree]) -> Span {
    tokens.first().map_or_else(Span::call_site, TokenTree::span)
}

fn visibility_of(vis: Option<&Vis>) -> Visibility {
    match vis {
        None => Visibility::Private,
        Some(Vis::Pub(_)) => Visibility::Public,
        Some(Vis::PubIn(restricted)) => {
            if restricted.second.0.stream().to_string() == "self" {
                Visibility::Private
            } else {
                Visibility::Protected
            }
        }
    }
}

/// Parses a whole `define!` block.
pub(crate) fn parse_define(input: TokenStream) -> Result<PHost, Diagnostic> {
    let raw_items = parse_items(input);

    let mut name: Option<Ident> = None;
    let mut fields = Vec::new();
    for raw in raw_items.iter().filter(|raw| raw.is_struct()) {
        if let Some(first) = &name {
            return Err(Diagnostic::new(
                format!("define! takes exactly one struct, `{first}` is already defined"),
                span_of(&raw.tokens),
            ));
        }
        let decl = to_stream(&raw.tokens)
            .to_token_iter()
            .parse::<Cons<StructDecl, EndOfStream>>()
            .map_err(|_| {
                Diagnostic::new(
                    "define! takes a struct with named fields and no generic parameters",
                    span_of(&raw.tokens),
                )
            })?
            .first;
        fields = parse_fields(decl.body.0.stream())?;
        name = Some(decl.name);
    }

    let Some(name) = name else {
        return Err(Diagnostic::new(
            "define! expects a struct definition",
            Span::call_site(),
        ));
    };

    let mut crate_path = quote! { ::equivalence };
    let mut items = Vec::with_capacity(raw_items.len());
    let mut directive: Option<PDirective> = None;
    for raw in raw_items {
        if raw.is_struct() {
            let (struct_tokens, path) = strip_container_attrs(&raw.tokens)?;
            if let Some(path) = path {
                crate_path = path;
            }
            items.push(PItem::Struct(to_stream(&struct_tokens)));
            continue;
        }
        if !raw.is_impl() {
            items.push(PItem::Other(to_stream(&raw.tokens)));
            continue;
        }
        match to_stream(&raw.tokens)
            .to_token_iter()
            .parse::<Cons<InherentImpl, EndOfStream>>()
        {
            Ok(imp) if imp.first.self_ty == name => {
                let imp = imp.first;
                let head = to_stream(&raw.tokens[..raw.tokens.len() - 1]);
                let body_span = imp.body.0.span();
                let body = parse_impl_body(imp.body.0.stream(), &mut directive)?;
                items.push(PItem::Impl(PImpl {
                    head,
                    body_span,
                    items: body,
                }));
            }
            _ => items.push(PItem::Other(to_stream(&raw.tokens))),
        }
    }

    let Some(directive) = directive else {
        return Err(Diagnostic::new(
            format!("missing `equivalence!(...)` in an `impl {name}` block"),
            name.span(),
        ));
    };

    Ok(PHost {
        name,
        crate_path,
        fields,
        items,
        directive,
    })
}

/// Removes `#[equivalence(...)]` from the struct, returning its `crate_path`.
///
/// Also rejects derives that would collide with the generated impls.
fn strip_container_attrs(
    tokens: &[TokenTree],
) -> Result<(Vec<TokenTree>, Option<TokenStream>), Diagnostic> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut crate_path = None;
    let mut i = 0;
    while let (Some(pound @ TokenTree::Punct(p)), Some(TokenTree::Group(g))) =
        (tokens.get(i), tokens.get(i + 1))
    {
        if p.as_char() != '#' || g.delimiter() != Delimiter::Bracket {
            break;
        }
        let mut content = g.stream().into_iter();
        match (content.next(), content.next()) {
            (Some(TokenTree::Ident(attr)), Some(TokenTree::Group(args))) if attr == "equivalence" => {
                let arg = args
                    .stream()
                    .to_token_iter()
                    .parse::<CratePathArg>()
                    .map_err(|_| {
                        Diagnostic::new("expected `#[equivalence(crate_path = path)]`", args.span())
                    })?;
                if arg.key != "crate_path" || arg.path.is_empty() {
                    return Err(Diagnostic::new(
                        format!("unknown equivalence attribute `{}`", arg.key),
                        arg.key.span(),
                    ));
                }
                crate_path = Some(arg.path.into_iter().collect());
            }
            (Some(TokenTree::Ident(attr)), Some(TokenTree::Group(derives))) if attr == "derive" => {
                reject_generated_derives(derives.stream())?;
                kept.push(pound.clone());
                kept.push(tokens[i + 1].clone());
            }
            _ => {
                kept.push(pound.clone());
                kept.push(tokens[i + 1].clone());
            }
        }
        i += 2;
    }
    kept.extend(tokens[i..].iter().cloned());
    Ok((kept, crate_path))
}

fn reject_generated_derives(derives: TokenStream) -> Result<(), Diagnostic> {
    for tt in derives {
        if let TokenTree::Ident(ident) = tt
            && (ident == "PartialEq" || ident == "Eq" || ident == "Hash")
        {
            return Err(Diagnostic::new(
                format!("`{ident}` is implemented by define!, remove it from #[derive]"),
                ident.span(),
            ));
        }
    }
    Ok(())
}

fn parse_fields(body: TokenStream) -> Result<Vec<PField>, Diagnostic> {
    let span = body
        .clone()
        .into_iter()
        .next()
        .map_or_else(Span::call_site, |t| t.span());
    let fields = body
        .to_token_iter()
        .parse::<Cons<CommaDelimitedVec<NamedField>, EndOfStream>>()
        .map_err(|_| Diagnostic::new("expected named fields", span))?
        .first;

    Ok(fields
        .into_iter()
        .map(|field| {
            let field = field.value;
            PField {
                name: unraw(&field.name.to_string()).to_string(),
                ty: field.ty.to_token_stream(),
                ident: field.name,
            }
        })
        .collect())
}

fn parse_impl_body(
    body: TokenStream,
    directive: &mut Option<PDirective>,
) -> Result<Vec<PImplItem>, Diagnostic> {
    let mut items = Vec::new();
    for raw in parse_items(body) {
        match raw.item {
            Some(Item::Macro(mac)) if mac.is_directive() => {
                let span = mac.path.first.span();
                if directive.is_some() {
                    return Err(Diagnostic::new("`equivalence!` may only appear once", span));
                }
                *directive = Some(PDirective {
                    specs: parse_specs(mac.args())?,
                    span,
                });
            }
            Some(Item::Fn(decl)) => items.push(PImplItem::Method(PMethod::new(&decl, raw.tokens))),
            _ => items.push(PImplItem::Other(to_stream(&raw.tokens))),
        }
    }
    Ok(items)
}

/// Parses the directive's arguments. An empty list is accepted here and
/// rejected by normalization.
fn parse_specs(args: TokenStream) -> Result<Vec<Specifier>, Diagnostic> {
    let span = args.clone().into_iter().next().map_or_else(Span::call_site, |t| t.span());
    let list = args
        .to_token_iter()
        .parse::<Cons<CommaDelimitedVec<SpecToken>, EndOfStream>>()
        .map_err(|_| {
            Diagnostic::new(
                "expected `@field`, `method` or a string literal, separated by commas",
                span,
            )
        })?
        .first;

    list.iter()
        .map(|spec| match &spec.value {
            SpecToken::Field(field) => Ok(Specifier::field(field.second.to_string())),
            SpecToken::Method(method) => Ok(Specifier::method(method.to_string())),
            SpecToken::Text(lit) => {
                let text = lit.to_string();
                match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
                    Some(inner) => Ok(Specifier::method(inner)),
                    None => Err(Diagnostic::new(
                        format!("expected a string literal, found {text}"),
                        lit.span(),
                    )),
                }
            }
        })
        .collect()
}
