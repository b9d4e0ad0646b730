//! The runtime deriver: readers first, then `hash`, then `eql?` and `==`.

use core::hash::Hasher;
use std::sync::Arc;

use equivalence_core::{
    Canonical, CanonicalAttr, ReaderPlan, SpecifierForm, Visibility, equivalence_hasher,
    plan_reader,
};

use crate::host::field_reader;
use crate::{
    CallError, Caller, HostTypeBuilder, Instance, Method, MethodBody, MethodOrigin, Value,
};
#[cfg(feature = "tracing")]
use crate::{debug, trace};

pub(crate) fn derive(host: &mut HostTypeBuilder, canonical: Canonical) {
    install_readers(host, &canonical);

    let attrs: Arc<[CanonicalAttr]> = canonical.into_vec().into();
    install(host, "hash", hash_method(Arc::clone(&attrs)));

    let eql = eql_method(attrs);
    install(host, "eql?", Arc::clone(&eql));
    install(host, "==", eql);
}

/// Makes every canonical name callable by peers, per [`plan_reader`].
fn install_readers(host: &mut HostTypeBuilder, canonical: &Canonical) {
    for name in canonical.names() {
        let existing = host.methods.lookup(name);
        match plan_reader(existing) {
            ReaderPlan::Untouched => {
                trace!("{}#{name}: {existing} reader left as is", host.name);
            }
            ReaderPlan::RaiseToProtected => {
                trace!("{}#{name}: private reader raised to protected", host.name);
                host.methods.set_visibility(name, Visibility::Protected);
            }
            ReaderPlan::SynthesizeProtected => {
                trace!("{}#{name}: synthesized protected reader", host.name);
                host.methods.insert(
                    name,
                    Method {
                        visibility: Visibility::Protected,
                        owner: host.key,
                        origin: MethodOrigin::Derived,
                        body: field_reader(name),
                    },
                );
            }
        }
    }
}

/// Installs a public derived method unless the host type declared its own.
///
/// Methods installed by an earlier derivation (on this type or a parent)
/// are replaced.
fn install(host: &mut HostTypeBuilder, name: &str, body: MethodBody) {
    if let Some(existing) = host.methods.get(name)
        && existing.origin == MethodOrigin::Declared
    {
        debug!("{}#{name} is declared by the type, not replacing it", host.name);
        return;
    }
    host.methods.insert(
        name,
        Method {
            visibility: Visibility::Public,
            owner: host.key,
            origin: MethodOrigin::Derived,
            body,
        },
    );
}

/// Reads one attribute of `receiver` on behalf of `caller`.
fn read(receiver: &Instance, attr: &CanonicalAttr, caller: Caller<'_>) -> Result<Value, CallError> {
    match attr.form {
        SpecifierForm::Field => receiver.read_field(&attr.name),
        SpecifierForm::Method => receiver.call(&attr.name, &[], caller),
    }
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), CallError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CallError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn hash_method(attrs: Arc<[CanonicalAttr]>) -> MethodBody {
    Arc::new(move |this: &Instance, args: &[Value]| -> Result<Value, CallError> {
        expect_arity("hash", args, 0)?;
        let mut hasher = equivalence_hasher();
        hasher.write_usize(attrs.len());
        for attr in attrs.iter() {
            read(this, attr, Caller::SelfCall)?.hash_into(&mut hasher)?;
        }
        Ok(Value::UInt(hasher.finish()))
    })
}

fn eql_method(attrs: Arc<[CanonicalAttr]>) -> MethodBody {
    Arc::new(move |this: &Instance, args: &[Value]| -> Result<Value, CallError> {
        expect_arity("eql?", args, 1)?;
        let Some(other) = args[0].as_object() else {
            return Ok(Value::Bool(false));
        };
        if other.host_type().key() != this.host_type().key() {
            return Ok(Value::Bool(false));
        }
        let peer = Caller::Peer(this.host_type());
        for attr in attrs.iter() {
            let mine = read(this, attr, Caller::SelfCall)?;
            let theirs = read(other, attr, peer)?;
            if !mine.eql(&theirs)? {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    })
}

#[cfg(test)]
mod tests {
    use crate::{HostTypeBuilder, Instance, MethodOrigin, Value};
    use equivalence_core::Visibility;

    #[equivalence_testhelpers::test]
    fn installs_hash_and_both_equality_names() {
        let ty = HostTypeBuilder::new("Point")
            .field("x")
            .equivalence(["@x"])
            .unwrap()
            .build();
        for name in ["hash", "eql?", "=="] {
            assert_eq!(ty.lookup(name), Visibility::Public, "{name}");
            assert_eq!(ty.methods().get(name).unwrap().origin, MethodOrigin::Derived);
        }
        assert_eq!(ty.lookup("x"), Visibility::Protected);
    }

    #[equivalence_testhelpers::test]
    fn declared_hash_is_never_overwritten() {
        let ty = HostTypeBuilder::new("Pinned")
            .field("x")
            .method("hash", Visibility::Public, |_, _| Ok(Value::UInt(7)))
            .equivalence(["@x"])
            .unwrap()
            .build();
        let a = Instance::new(&ty).with("x", 1).unwrap();
        assert_eq!(a.hash_code().unwrap(), 7);
        assert_eq!(ty.methods().get("hash").unwrap().origin, MethodOrigin::Declared);
    }

    #[equivalence_testhelpers::test]
    fn duplicate_specifiers_synthesize_once() {
        let ty = HostTypeBuilder::new("Twice")
            .field("x")
            .equivalence(["@x", "x", "@x"])
            .unwrap()
            .build();
        assert_eq!(ty.lookup("x"), Visibility::Protected);
        assert_eq!(ty.methods().names().filter(|n| *n == "x").count(), 1);
    }

    #[equivalence_testhelpers::test]
    fn equality_rejects_non_objects() {
        let ty = HostTypeBuilder::new("Point")
            .field("x")
            .equivalence(["@x"])
            .unwrap()
            .build();
        let a = Instance::new(&ty);
        let result = a.call("eql?", &[Value::from(1)], crate::Caller::External);
        assert!(!result.unwrap().as_bool().unwrap());
    }
}
