use core::any::Any;
use core::hash::{Hash, Hasher};
use std::hash::DefaultHasher;

use crate::Shape;

/// Implemented by `equivalence::define!` for every host type.
///
/// `==` ([`PartialEq`]), [`Hash`] and [`Equivalence::eql`] all read the same
/// ordered attribute list, so `a == b` implies
/// `a.equivalence_hash() == b.equivalence_hash()`.
pub trait Equivalence: PartialEq + Eq + Hash + Any + Sized {
    /// Static description of the derived attributes and readers.
    const SHAPE: &'static Shape;

    /// Equality against a value of unknown type.
    ///
    /// True only when `other` has exactly the type `Self` (no conversions,
    /// no wrapper types) and every attribute compares equal.
    fn eql(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| self == other)
    }

    /// Deterministic combined hash of the attribute values, in order.
    fn equivalence_hash(&self) -> u64 {
        combined_hash(self)
    }
}

/// A hasher with fixed keys, so equal inputs hash equally across instances
/// and runs of the same build.
pub fn equivalence_hasher() -> DefaultHasher {
    DefaultHasher::new()
}

/// Hashes `value` with [`equivalence_hasher`].
pub fn combined_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = equivalence_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}
