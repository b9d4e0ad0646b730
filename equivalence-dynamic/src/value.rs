use core::hash::Hasher;
use std::sync::Arc;

use crate::{CallError, Caller, Instance};

/// A dynamically typed value held in an instance field.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value; what an unset field reads as.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer (hash codes are returned as this).
    UInt(u64),
    /// A string.
    Str(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// An instance of some host type.
    Object(Arc<Instance>),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Is this `Null`?
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The instance, if this is an object.
    pub fn as_object(&self) -> Option<&Arc<Instance>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Structural equality, dispatching to `eql?` for objects.
    ///
    /// Scalars compare by variant and content (`Int(1)` is not `UInt(1)`),
    /// lists element-wise. An object whose type has a public `eql?` method
    /// decides for itself; otherwise objects are equal only to themselves.
    pub fn eql(&self, other: &Value) -> Result<bool, CallError> {
        Ok(match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.eql(y)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Value::Object(a), Value::Object(_)) if a.responds_to("eql?") => {
                let result = a.call("eql?", core::slice::from_ref(other), Caller::External)?;
                result.as_bool().ok_or_else(|| CallError::WrongType {
                    name: "eql?".into(),
                    expected: "bool",
                    got: result.kind(),
                })?
            }
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        })
    }

    /// Feeds the value into `state`, dispatching to `hash` for objects.
    ///
    /// Consistent with [`Value::eql`]: values that are `eql` hash equally.
    pub fn hash_into<H: Hasher>(&self, state: &mut H) -> Result<(), CallError> {
        state.write_u8(self.discriminant());
        match self {
            Value::Null => {}
            Value::Bool(b) => state.write_u8(u8::from(*b)),
            Value::Int(i) => state.write_i64(*i),
            Value::UInt(u) => state.write_u64(*u),
            Value::Str(s) => {
                state.write(s.as_bytes());
                state.write_u8(0xff);
            }
            Value::List(items) => {
                state.write_usize(items.len());
                for item in items {
                    item.hash_into(state)?;
                }
            }
            Value::Object(o) if o.responds_to("hash") => {
                let code = o.hash_code()?;
                state.write_u64(code);
            }
            Value::Object(o) => state.write_usize(Arc::as_ptr(o) as usize),
        }
        Ok(())
    }

    fn discriminant(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::UInt(_) => 3,
            Value::Str(_) => 4,
            Value::List(_) => 5,
            Value::Object(_) => 6,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(Arc::new(instance))
    }
}

impl From<Arc<Instance>> for Value {
    fn from(instance: Arc<Instance>) -> Self {
        Value::Object(instance)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
