use std::sync::Arc;

use equivalence_core::Visibility;
use indexmap::IndexMap;

use crate::{CallError, HostType, Instance, TypeKey, Value};

/// Body of a method: receives the receiver and the arguments.
pub type MethodBody = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value, CallError> + Send + Sync>;

/// Who defined a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodOrigin {
    /// Written by the host type itself.
    Declared,
    /// Installed by the equivalence directive.
    Derived,
}

/// An entry in a [`MethodTable`].
#[derive(Clone)]
pub struct Method {
    /// Who may call it.
    pub visibility: Visibility,
    /// The type that defined it; protected calls are allowed from kinds of
    /// this type.
    pub owner: TypeKey,
    /// Who wrote it.
    pub origin: MethodOrigin,
    /// What it does.
    pub body: MethodBody,
}

impl Method {
    /// Invokes the body without any access check.
    pub fn invoke(&self, receiver: &Instance, args: &[Value]) -> Result<Value, CallError> {
        (self.body)(receiver, args)
    }
}

impl core::fmt::Debug for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Method")
            .field("visibility", &self.visibility)
            .field("owner", &self.owner)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Named methods of a host type, in definition order.
///
/// The table is only ever edited entry by entry; derivation never replaces
/// it wholesale.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: IndexMap<String, Method>,
}

impl MethodTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility of `name`, or [`Visibility::Absent`].
    pub fn lookup(&self, name: &str) -> Visibility {
        self.entries
            .get(name)
            .map_or(Visibility::Absent, |m| m.visibility)
    }

    /// The method called `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.entries.get(name)
    }

    /// Defines or redefines `name`, returning the method it replaced.
    pub fn insert(&mut self, name: impl Into<String>, method: Method) -> Option<Method> {
        self.entries.insert(name.into(), method)
    }

    /// Changes the visibility of an existing method, keeping its body.
    ///
    /// Returns `false` if there is no such method.
    pub fn set_visibility(&mut self, name: &str, visibility: Visibility) -> bool {
        match self.entries.get_mut(name) {
            Some(method) => {
                method.visibility = visibility;
                true
            }
            None => false,
        }
    }

    /// Method names, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The calling context of a method call, used for access checks.
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    /// Code outside any instance: only public methods.
    External,
    /// Another instance, of the given type: public methods, and protected
    /// ones when that type is a kind of the method's owner.
    Peer(&'a HostType),
    /// The receiver calling itself: everything.
    SelfCall,
}

impl Caller<'_> {
    /// Whether this caller may invoke `method`.
    pub fn may_call(&self, method: &Method) -> bool {
        match method.visibility {
            Visibility::Public => true,
            Visibility::Protected => match self {
                Caller::External => false,
                Caller::Peer(ty) => ty.is_kind_of(method.owner),
                Caller::SelfCall => true,
            },
            Visibility::Private => matches!(self, Caller::SelfCall),
            Visibility::Absent => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(visibility: Visibility, owner: TypeKey) -> Method {
        Method {
            visibility,
            owner,
            origin: MethodOrigin::Declared,
            body: Arc::new(|_: &Instance, _: &[Value]| Ok(Value::from("zomg"))),
        }
    }

    #[equivalence_testhelpers::test]
    fn lookup_and_set_visibility() {
        let owner = TypeKey::fresh();
        let mut table = MethodTable::new();
        assert_eq!(table.lookup("var"), Visibility::Absent);

        table.insert("var", constant(Visibility::Private, owner));
        assert_eq!(table.lookup("var"), Visibility::Private);

        assert!(table.set_visibility("var", Visibility::Protected));
        assert_eq!(table.lookup("var"), Visibility::Protected);
        assert!(!table.set_visibility("missing", Visibility::Public));
        assert_eq!(table.names().collect::<Vec<_>>(), ["var"]);
    }

    #[equivalence_testhelpers::test]
    fn external_callers_only_reach_public_methods() {
        let owner = TypeKey::fresh();
        assert!(Caller::External.may_call(&constant(Visibility::Public, owner)));
        assert!(!Caller::External.may_call(&constant(Visibility::Protected, owner)));
        assert!(!Caller::External.may_call(&constant(Visibility::Private, owner)));
        assert!(Caller::SelfCall.may_call(&constant(Visibility::Private, owner)));
    }
}
