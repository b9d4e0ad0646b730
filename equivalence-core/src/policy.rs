//! Reader policy: what the accessor stage does with each canonical name.
//!
//! | existing    | action                         | afterwards  |
//! |-------------|--------------------------------|-------------|
//! | `public`    | nothing                        | `public`    |
//! | `protected` | nothing                        | `protected` |
//! | `private`   | keep the body, raise exposure  | `protected` |
//! | absent      | synthesize a field reader      | `protected` |
//!
//! Equality calls readers on the *other* instance too, so every reader must
//! end up at least protected.

use crate::Visibility;
#[cfg(feature = "tracing")]
use crate::trace;

/// What the accessor stage must do for one canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderPlan {
    /// A public or protected method exists; leave it alone.
    Untouched,
    /// A private method exists; keep its body, make it protected.
    RaiseToProtected,
    /// Nothing exists; install a protected reader for the field.
    SynthesizeProtected,
}

impl ReaderPlan {
    /// Visibility of the name once the plan has been applied.
    pub const fn resulting_visibility(self, existing: Visibility) -> Visibility {
        match self {
            ReaderPlan::Untouched => existing,
            ReaderPlan::RaiseToProtected | ReaderPlan::SynthesizeProtected => {
                Visibility::Protected
            }
        }
    }

    /// How the resulting reader came to be.
    pub const fn origin(self) -> ReaderOrigin {
        match self {
            ReaderPlan::Untouched => ReaderOrigin::Declared,
            ReaderPlan::RaiseToProtected => ReaderOrigin::Raised,
            ReaderPlan::SynthesizeProtected => ReaderOrigin::Synthesized,
        }
    }
}

/// Provenance of a reader after derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderOrigin {
    /// Declared by the host type and left exactly as it was.
    Declared,
    /// Declared private by the host type; body kept, exposure raised.
    Raised,
    /// Installed by derivation.
    Synthesized,
}

impl ReaderOrigin {
    /// The variant's name, as generated code spells it.
    pub const fn variant_name(self) -> &'static str {
        match self {
            ReaderOrigin::Declared => "Declared",
            ReaderOrigin::Raised => "Raised",
            ReaderOrigin::Synthesized => "Synthesized",
        }
    }
}

/// Decides what to do with a name, given its current visibility.
pub fn plan_reader(existing: Visibility) -> ReaderPlan {
    let plan = match existing {
        Visibility::Public | Visibility::Protected => ReaderPlan::Untouched,
        Visibility::Private => ReaderPlan::RaiseToProtected,
        Visibility::Absent => ReaderPlan::SynthesizeProtected,
    };
    trace!("reader plan for {existing} method: {plan:?}");
    plan
}
