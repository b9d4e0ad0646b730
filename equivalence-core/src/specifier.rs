//! The specifier normalizer.
//!
//! A specifier is the raw token a caller hands to the equivalence directive.
//! `@name` marks a raw field, a bare `name` is read through the type's own
//! method dispatch. Normalization strips the marker and remembers which form
//! each specifier had.

use crate::DeriveError;
#[cfg(feature = "tracing")]
use crate::{debug, trace};

/// Leading marker that turns a specifier into its field form.
pub const FIELD_MARKER: char = '@';

/// How a canonical name is read when hashing and comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierForm {
    /// Direct read of the instance field.
    Field,
    /// Zero-argument call through the type's own methods.
    Method,
}

impl SpecifierForm {
    /// The variant's name, as generated code spells it.
    pub const fn variant_name(self) -> &'static str {
        match self {
            SpecifierForm::Field => "Field",
            SpecifierForm::Method => "Method",
        }
    }
}

/// A raw attribute specifier, exactly as the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    raw: String,
}

impl Specifier {
    /// A field-form specifier for `name` (equivalent to `"@name"`).
    pub fn field(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let mut raw = String::with_capacity(name.len() + 1);
        raw.push(FIELD_MARKER);
        raw.push_str(name);
        Self { raw }
    }

    /// A method-form specifier for `name`.
    ///
    /// The text is kept verbatim, so a leading marker still makes it field
    /// form; both spellings normalize the same way.
    pub fn method(name: impl Into<String>) -> Self {
        Self { raw: name.into() }
    }

    /// The raw text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Splits the specifier into its canonical name and form.
    pub fn canonicalize(&self) -> CanonicalAttr {
        match self.raw.strip_prefix(FIELD_MARKER) {
            Some(name) => CanonicalAttr {
                name: name.to_string(),
                form: SpecifierForm::Field,
            },
            None => CanonicalAttr {
                name: self.raw.clone(),
                form: SpecifierForm::Method,
            },
        }
    }
}

impl From<&str> for Specifier {
    fn from(raw: &str) -> Self {
        Self::method(raw)
    }
}

impl From<String> for Specifier {
    fn from(raw: String) -> Self {
        Self::method(raw)
    }
}

impl From<&String> for Specifier {
    fn from(raw: &String) -> Self {
        Self::method(raw.clone())
    }
}

impl core::fmt::Display for Specifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A specifier with its field marker stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalAttr {
    /// Name used for the reader method (and the field, for field form).
    pub name: String,
    /// Whether the hash/equality stage reads the field or calls the method.
    pub form: SpecifierForm,
}

/// The ordered, non-empty output of [`normalize`].
///
/// Order is significant and duplicates are kept: the same list drives reader
/// synthesis, hashing and comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    attrs: Vec<CanonicalAttr>,
}

impl Canonical {
    /// Canonical names, in specifier order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(|a| a.name.as_str())
    }

    /// Form tags, parallel to [`Canonical::names`].
    pub fn forms(&self) -> impl Iterator<Item = SpecifierForm> + '_ {
        self.attrs.iter().map(|a| a.form)
    }

    /// Number of attributes (never zero).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Take ownership of the attribute list.
    pub fn into_vec(self) -> Vec<CanonicalAttr> {
        self.attrs
    }
}

impl<'a> IntoIterator for &'a Canonical {
    type Item = &'a CanonicalAttr;
    type IntoIter = core::slice::Iter<'a, CanonicalAttr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

/// Validates and canonicalizes a raw specifier list.
///
/// Fails with [`DeriveError::InvalidArgument`] when the list is empty. No
/// other validation happens here: names that are not identifiers, or that
/// resolve to nothing, are left for the generated readers to trip over.
pub fn normalize<I, S>(specs: I) -> Result<Canonical, DeriveError>
where
    I: IntoIterator<Item = S>,
    S: Into<Specifier>,
{
    let attrs: Vec<CanonicalAttr> = specs
        .into_iter()
        .map(|s| {
            let spec = s.into();
            let attr = spec.canonicalize();
            trace!("specifier {spec} -> {} ({:?})", attr.name, attr.form);
            attr
        })
        .collect();

    if attrs.is_empty() {
        return Err(DeriveError::empty());
    }

    debug!("normalized {} specifier(s)", attrs.len());
    Ok(Canonical { attrs })
}
