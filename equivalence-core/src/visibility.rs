/// How exposed a method name is on a host type.
///
/// The variants are declared from least to most exposed, but the reader
/// policy does not simply take the maximum of anything: see
/// [`plan_reader`](crate::plan_reader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    /// No method by that name.
    Absent,
    /// Callable only by the instance itself.
    Private,
    /// Callable by the instance and by other instances of the same type.
    Protected,
    /// Callable by anyone.
    Public,
}

impl Visibility {
    /// Whether another instance of the same type may call it.
    ///
    /// Equality needs this for every reader it calls on `other`.
    pub const fn is_callable_from_peer(self) -> bool {
        matches!(self, Visibility::Protected | Visibility::Public)
    }

    /// The variant's name, as generated code spells it.
    pub const fn variant_name(self) -> &'static str {
        match self {
            Visibility::Absent => "Absent",
            Visibility::Private => "Private",
            Visibility::Protected => "Protected",
            Visibility::Public => "Public",
        }
    }

    /// Lowercase name, as used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Visibility::Absent => "absent",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

impl core::fmt::Display for Visibility {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
