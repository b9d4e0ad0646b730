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

mod specifier;
pub use specifier::*;

mod visibility;
pub use visibility::*;

mod policy;
pub use policy::*;

mod shape;
pub use shape::*;

mod traits;
pub use traits::*;
