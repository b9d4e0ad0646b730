use crate::{ReaderOrigin, SpecifierForm, Visibility};

/// Static description of a type produced by `equivalence::define!`.
///
/// This is the introspection side of derivation: it records which
/// attributes take part in equality and hashing, and every inherent method
/// of the type as it stands after readers were installed or raised.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    /// Name of the host type, as written in its definition.
    pub type_name: &'static str,

    /// Attributes in specifier order (duplicates included).
    pub attributes: &'static [AttrShape],

    /// Inherent methods after derivation, in declaration order, with
    /// synthesized readers last.
    pub methods: &'static [MethodShape],
}

impl Shape {
    /// Visibility of the method `name`, or [`Visibility::Absent`].
    pub fn lookup(&self, name: &str) -> Visibility {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .map_or(Visibility::Absent, |m| m.visibility)
    }

    /// First attribute with the given canonical name.
    pub fn attribute(&self, name: &str) -> Option<&'static AttrShape> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Canonical attribute names, in specifier order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &'static str> {
        self.attributes.iter().map(|a| a.name)
    }
}

impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}(", self.type_name)?;
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if attr.form == SpecifierForm::Field {
                f.write_str("@")?;
            }
            f.write_str(attr.name)?;
        }
        f.write_str(")")
    }
}

/// One attribute taking part in equality and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrShape {
    /// Canonical name (no field marker).
    pub name: &'static str,

    /// How hashing and equality read the value.
    pub form: SpecifierForm,

    /// Visibility of the reader before derivation.
    pub declared: Visibility,

    /// Visibility of the reader after derivation.
    pub reader: Visibility,

    /// What derivation did to the reader.
    pub origin: ReaderOrigin,
}

/// An inherent method of the host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodShape {
    /// Method name.
    pub name: &'static str,

    /// Visibility after derivation.
    pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
    use super::*;

    static POINT: Shape = Shape {
        type_name: "Point",
        attributes: &[
            AttrShape {
                name: "x",
                form: SpecifierForm::Field,
                declared: Visibility::Public,
                reader: Visibility::Public,
                origin: ReaderOrigin::Declared,
            },
            AttrShape {
                name: "y",
                form: SpecifierForm::Method,
                declared: Visibility::Absent,
                reader: Visibility::Protected,
                origin: ReaderOrigin::Synthesized,
            },
        ],
        methods: &[
            MethodShape {
                name: "x",
                visibility: Visibility::Public,
            },
            MethodShape {
                name: "y",
                visibility: Visibility::Protected,
            },
        ],
    };

    #[equivalence_testhelpers::test]
    fn lookup_reports_absent_for_unknown_names() {
        assert_eq!(POINT.lookup("x"), Visibility::Public);
        assert_eq!(POINT.lookup("y"), Visibility::Protected);
        assert_eq!(POINT.lookup("z"), Visibility::Absent);
    }

    #[equivalence_testhelpers::test]
    fn display_marks_field_form() {
        assert_eq!(POINT.to_string(), "Point(@x, y)");
        assert_eq!(POINT.attribute_names().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(
            POINT.attribute("y").map(|a| a.origin),
            Some(ReaderOrigin::Synthesized)
        );
    }
}
