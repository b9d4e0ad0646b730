/// Errors raised by the equivalence directive itself.
///
/// Derivation checks nothing beyond the shape of its argument list: a
/// specifier that names neither a field nor a method only fails later, when
/// the generated code tries to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    /// The directive was invoked with an unusable argument list.
    InvalidArgument {
        /// What was wrong with the arguments.
        reason: &'static str,
    },
}

impl DeriveError {
    /// The error for an empty specifier list.
    pub const fn empty() -> Self {
        DeriveError::InvalidArgument {
            reason: "at least one attribute is required",
        }
    }
}

impl core::fmt::Display for DeriveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeriveError::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
        }
    }
}

impl core::error::Error for DeriveError {}
