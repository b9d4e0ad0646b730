use equivalence_core::Visibility;

/// Errors raised while dispatching a call or reading a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The type has neither a method nor a field by that name.
    NoSuchMember {
        /// Name of the receiver's type.
        type_name: String,
        /// The name that failed to resolve.
        name: String,
    },

    /// The method exists but the caller may not invoke it.
    NotAccessible {
        /// Name of the receiver's type.
        type_name: String,
        /// The method that was called.
        name: String,
        /// Its visibility.
        visibility: Visibility,
    },

    /// Wrong number of arguments.
    Arity {
        /// The method that was called.
        name: String,
        /// How many arguments it takes.
        expected: usize,
        /// How many it was given.
        got: usize,
    },

    /// A method returned a value of the wrong kind (e.g. a `hash` that is
    /// not an unsigned integer).
    WrongType {
        /// The method whose result was unexpected.
        name: String,
        /// What the caller needed.
        expected: &'static str,
        /// What it got.
        got: &'static str,
    },
}

impl core::fmt::Display for CallError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CallError::NoSuchMember { type_name, name } => {
                write!(f, "undefined method or field `{name}` for {type_name}")
            }
            CallError::NotAccessible {
                type_name,
                name,
                visibility,
            } => write!(f, "{visibility} method `{name}` called for {type_name}"),
            CallError::Arity {
                name,
                expected,
                got,
            } => write!(
                f,
                "wrong number of arguments for `{name}` (given {got}, expected {expected})"
            ),
            CallError::WrongType {
                name,
                expected,
                got,
            } => write!(f, "`{name}` returned {got}, expected {expected}"),
        }
    }
}

impl core::error::Error for CallError {}
