#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![doc = include_str!("../README.md")]

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use trace;

#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use debug;

mod error;
pub use error::*;

mod value;
pub use value::*;

mod method;
pub use method::*;

mod host;
pub use host::*;

mod instance;
pub use instance::*;

mod derive;

pub use equivalence_core::{DeriveError, Specifier, SpecifierForm, Visibility};
