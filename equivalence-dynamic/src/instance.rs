use std::sync::Arc;

use indexmap::IndexMap;

use crate::{CallError, Caller, HostType, Value};
#[cfg(feature = "tracing")]
use crate::trace;

/// An instance of a [`HostType`].
#[derive(Clone)]
pub struct Instance {
    ty: Arc<HostType>,
    fields: IndexMap<String, Value>,
}

impl Instance {
    /// A fresh instance with every field unset.
    pub fn new(ty: &Arc<HostType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            fields: IndexMap::new(),
        }
    }

    /// The instance's exact type.
    pub fn host_type(&self) -> &Arc<HostType> {
        &self.ty
    }

    /// Sets a declared field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CallError> {
        if !self.ty.has_field(name) {
            return Err(self.no_such_member(name));
        }
        self.fields.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Builder-style [`Instance::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, CallError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// The current value of a declared field (`Null` when unset).
    pub fn read_field(&self, name: &str) -> Result<Value, CallError> {
        if !self.ty.has_field(name) {
            return Err(self.no_such_member(name));
        }
        Ok(self.fields.get(name).cloned().unwrap_or_default())
    }

    /// Whether a public method `name` exists.
    pub fn responds_to(&self, name: &str) -> bool {
        self.ty.lookup(name) == equivalence_core::Visibility::Public
    }

    /// Calls a method, enforcing visibility for `caller`.
    pub fn call(&self, name: &str, args: &[Value], caller: Caller<'_>) -> Result<Value, CallError> {
        let method = self
            .ty
            .methods()
            .get(name)
            .ok_or_else(|| self.no_such_member(name))?;
        if !caller.may_call(method) {
            return Err(CallError::NotAccessible {
                type_name: self.ty.name().to_string(),
                name: name.to_string(),
                visibility: method.visibility,
            });
        }
        trace!("{}#{name} ({} arg(s))", self.ty.name(), args.len());
        method.invoke(self, args)
    }

    /// Calls a method as the instance itself, whatever its visibility.
    pub fn send(&self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        self.call(name, args, Caller::SelfCall)
    }

    /// `self.eql?(other)`, through the public `eql?` method.
    pub fn eql(&self, other: &Instance) -> Result<bool, CallError> {
        let result = self.call(
            "eql?",
            &[Value::Object(Arc::new(other.clone()))],
            Caller::External,
        )?;
        result.as_bool().ok_or_else(|| CallError::WrongType {
            name: "eql?".into(),
            expected: "bool",
            got: result.kind(),
        })
    }

    /// `self == other`, through the public `==` method.
    pub fn equals(&self, other: &Instance) -> Result<bool, CallError> {
        let result = self.call(
            "==",
            &[Value::Object(Arc::new(other.clone()))],
            Caller::External,
        )?;
        result.as_bool().ok_or_else(|| CallError::WrongType {
            name: "==".into(),
            expected: "bool",
            got: result.kind(),
        })
    }

    /// `self.hash`, through the public `hash` method.
    pub fn hash_code(&self) -> Result<u64, CallError> {
        match self.call("hash", &[], Caller::External)? {
            Value::UInt(code) => Ok(code),
            other => Err(CallError::WrongType {
                name: "hash".into(),
                expected: "uint",
                got: other.kind(),
            }),
        }
    }

    fn no_such_member(&self, name: &str) -> CallError {
        CallError::NoSuchMember {
            type_name: self.ty.name().to_string(),
            name: name.to_string(),
        }
    }
}

impl core::fmt::Debug for Instance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        for field in self.ty.fields() {
            s.field(field, self.fields.get(field).unwrap_or(&Value::Null));
        }
        s.finish()
    }
}
