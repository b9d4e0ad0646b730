use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use equivalence_core::{DeriveError, Specifier, Visibility};

use crate::{CallError, Instance, Method, MethodBody, MethodOrigin, MethodTable, Value};
#[cfg(feature = "tracing")]
use crate::debug;

/// Identity of a host type. Two types built separately never share a key,
/// even when their names and method tables look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(u64);

impl TypeKey {
    /// Allocates a key no other type has.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TypeKey(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A finished host type: fields, methods, ancestry.
///
/// Built once with [`HostTypeBuilder`] and then shared behind an [`Arc`];
/// it does not change afterwards.
pub struct HostType {
    name: String,
    key: TypeKey,
    /// This type's key followed by its ancestors', nearest first.
    lineage: Vec<TypeKey>,
    fields: Vec<String>,
    methods: MethodTable,
}

impl HostType {
    /// The type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type's identity.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Whether this type is `key` or descends from it.
    pub fn is_kind_of(&self, key: TypeKey) -> bool {
        self.lineage.contains(&key)
    }

    /// Visibility of the method `name`, or [`Visibility::Absent`].
    pub fn lookup(&self, name: &str) -> Visibility {
        self.methods.lookup(name)
    }

    /// The method table.
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether `name` is a declared field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// A fresh instance of this type, every field unset.
    pub fn instantiate(self: &Arc<Self>) -> Instance {
        Instance::new(self)
    }
}

impl core::fmt::Debug for HostType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostType")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("fields", &self.fields)
            .field("methods", &self.methods.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Assembles a [`HostType`].
///
/// Everything that shapes the type, including the
/// [`equivalence`](HostTypeBuilder::equivalence) directive, happens here,
/// before [`build`](HostTypeBuilder::build) makes it immutable.
pub struct HostTypeBuilder {
    pub(crate) name: String,
    pub(crate) key: TypeKey,
    pub(crate) lineage: Vec<TypeKey>,
    pub(crate) fields: Vec<String>,
    pub(crate) methods: MethodTable,
}

impl HostTypeBuilder {
    /// A new type with no fields and no methods.
    pub fn new(name: impl Into<String>) -> Self {
        let key = TypeKey::fresh();
        Self {
            name: name.into(),
            key,
            lineage: vec![key],
            fields: Vec::new(),
            methods: MethodTable::new(),
        }
    }

    /// A new type inheriting `parent`'s fields and methods.
    ///
    /// The subtype gets its own key: its instances are never `eql` to the
    /// parent's.
    pub fn subtype_of(parent: &Arc<HostType>, name: impl Into<String>) -> Self {
        let key = TypeKey::fresh();
        let mut lineage = Vec::with_capacity(parent.lineage.len() + 1);
        lineage.push(key);
        lineage.extend_from_slice(&parent.lineage);
        Self {
            name: name.into(),
            key,
            lineage,
            fields: parent.fields.clone(),
            methods: parent.methods.clone(),
        }
    }

    /// Declares a field. Unset fields read as [`Value::Null`].
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Defines (or redefines) a method.
    pub fn method<F>(mut self, name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        let body: MethodBody = Arc::new(body);
        self.methods.insert(
            name,
            Method {
                visibility,
                owner: self.key,
                origin: MethodOrigin::Declared,
                body,
            },
        );
        self
    }

    /// Declares a field together with a public reader for it.
    pub fn attr_reader(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let reader = field_reader(&name);
        let mut this = self.field(name.clone());
        this.methods.insert(
            name,
            Method {
                visibility: Visibility::Public,
                owner: this.key,
                origin: MethodOrigin::Declared,
                body: reader,
            },
        );
        this
    }

    /// Changes the visibility of an already defined method.
    pub fn visibility(mut self, name: &str, visibility: Visibility) -> Result<Self, CallError> {
        if self.methods.set_visibility(name, visibility) {
            Ok(self)
        } else {
            Err(CallError::NoSuchMember {
                type_name: self.name,
                name: name.to_string(),
            })
        }
    }

    /// Visibility of the method `name` as the type currently stands.
    pub fn lookup(&self, name: &str) -> Visibility {
        self.methods.lookup(name)
    }

    /// The equivalence directive.
    ///
    /// Installs protected readers where needed, then `hash`, `eql?` and
    /// `==`, all reading `specs` in order. Fails only when `specs` is empty,
    /// in which case nothing is installed.
    pub fn equivalence<I, S>(mut self, specs: I) -> Result<Self, DeriveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Specifier>,
    {
        let canonical = equivalence_core::normalize(specs)?;
        debug!("deriving equivalence for {}", self.name);
        crate::derive::derive(&mut self, canonical);
        Ok(self)
    }

    /// Finishes the type.
    pub fn build(self) -> Arc<HostType> {
        Arc::new(HostType {
            name: self.name,
            key: self.key,
            lineage: self.lineage,
            fields: self.fields,
            methods: self.methods,
        })
    }
}

/// A zero-argument method returning the field `name`.
pub(crate) fn field_reader(name: &str) -> MethodBody {
    let name = name.to_string();
    Arc::new(move |this: &Instance, args: &[Value]| -> Result<Value, CallError> {
        if !args.is_empty() {
            return Err(CallError::Arity {
                name: name.clone(),
                expected: 0,
                got: args.len(),
            });
        }
        this.read_field(&name)
    })
}
