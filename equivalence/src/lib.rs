#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![doc = include_str!("../README.md")]

pub use equivalence_core::*;

pub use equivalence_macros::define;

/// Runtime host types and the directive that derives equality for them.
#[cfg(feature = "dynamic")]
pub use equivalence_dynamic as dynamic;
