use std::collections::{HashMap, HashSet};

use equivalence::{Equivalence, ReaderOrigin, SpecifierForm, Visibility};

equivalence::define! {
    #[derive(Debug, Clone)]
    pub struct Point {
        x: i32,
        y: i32,
    }

    impl Point {
        equivalence!(@x, @y);

        pub fn new(x: i32, y: i32) -> Self {
            Self { x, y }
        }
    }
}

equivalence::define! {
    /// Same data as [`Point`], spelled with strings.
    #[derive(Debug)]
    pub struct Textual {
        x: i32,
        y: i32,
    }

    impl Textual {
        equivalence!("@x", "y");
    }
}

#[equivalence_testhelpers::test]
fn equal_points_are_eql_and_hash_alike() {
    let a = Point::new(1, 2);
    let b = Point::new(1, 2);
    assert_eq!(a, b);
    assert!(a.eql(&b));
    assert_eq!(a.equivalence_hash(), b.equivalence_hash());

    let set: HashSet<Point> = [a, b, Point::new(2, 1)].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[equivalence_testhelpers::test]
fn different_points_are_not_eql() {
    let a = Point::new(1, 2);
    let c = Point::new(1, 3);
    assert_ne!(a, c);
    assert!(!a.eql(&c));
}

#[equivalence_testhelpers::test]
fn attribute_order_matters_for_the_hash() {
    assert_ne!(
        Point::new(1, 2).equivalence_hash(),
        Point::new(2, 1).equivalence_hash()
    );
}

#[equivalence_testhelpers::test]
fn eql_requires_the_exact_type() {
    let point = Point::new(1, 2);
    let textual = Textual { x: 1, y: 2 };
    assert!(!point.eql(&textual));
    assert!(!textual.eql(&point));
    assert!(!point.eql(&(1, 2)));
    assert!(textual.eql(&Textual { x: 1, y: 2 }));
}

#[equivalence_testhelpers::test]
fn absent_readers_are_synthesized_protected() {
    assert_eq!(Point::SHAPE.lookup("x"), Visibility::Protected);
    assert_eq!(Point::SHAPE.lookup("new"), Visibility::Public);
    assert_eq!(Point::SHAPE.lookup("z"), Visibility::Absent);

    let x = Point::SHAPE.attribute("x").unwrap();
    assert_eq!(x.form, SpecifierForm::Field);
    assert_eq!(x.declared, Visibility::Absent);
    assert_eq!(x.origin, ReaderOrigin::Synthesized);

    let p = Point::new(3, 4);
    assert_eq!((*p.x(), *p.y()), (3, 4));
}

#[equivalence_testhelpers::test]
fn string_specifiers_match_symbolic_ones() {
    assert_eq!(Textual::SHAPE.to_string(), "Textual(@x, y)");
    assert_eq!(Point::SHAPE.to_string(), "Point(@x, @y)");

    let y = Textual::SHAPE.attribute("y").unwrap();
    assert_eq!(y.form, SpecifierForm::Method);
    assert_eq!(y.origin, ReaderOrigin::Synthesized);
    assert_eq!(Textual { x: 5, y: 6 }, Textual { x: 5, y: 6 });
}

equivalence::define! {
    #[derive(Debug)]
    struct Secretive {
        var: u8,
    }

    impl Secretive {
        equivalence!(@var);

        fn var(&self) -> &str {
            "zomg"
        }
    }
}

#[equivalence_testhelpers::test]
fn private_readers_are_raised_not_replaced() {
    assert_eq!(Secretive::SHAPE.lookup("var"), Visibility::Protected);
    let var = Secretive::SHAPE.attribute("var").unwrap();
    assert_eq!(var.declared, Visibility::Private);
    assert_eq!(var.origin, ReaderOrigin::Raised);

    let s = Secretive { var: 1 };
    assert_eq!(s.var(), "zomg");
    // field form compares the field, not the reader
    assert_ne!(s, Secretive { var: 2 });
}

mod exposed {
    equivalence::define! {
        pub struct Public {
            var: u8,
        }

        impl Public {
            equivalence!(@var);

            pub fn var(&self) -> u8 {
                self.var
            }
        }
    }

    equivalence::define! {
        pub struct Protected {
            var: u8,
        }

        impl Protected {
            equivalence!(@var);

            pub(crate) fn var(&self) -> u8 {
                self.var
            }
        }
    }
}

#[equivalence_testhelpers::test]
fn accessible_readers_keep_their_visibility() {
    use exposed::{Protected, Public};

    assert_eq!(Public::SHAPE.lookup("var"), Visibility::Public);
    assert_eq!(Protected::SHAPE.lookup("var"), Visibility::Protected);
    for shape in [Public::SHAPE, Protected::SHAPE] {
        assert_eq!(shape.attribute("var").unwrap().origin, ReaderOrigin::Declared);
    }
}

equivalence::define! {
    #[derive(Debug)]
    struct Email {
        address: String,
    }

    impl Email {
        equivalence!(normalized);

        fn normalized(&self) -> String {
            self.address.to_lowercase()
        }
    }
}

#[equivalence_testhelpers::test]
fn method_form_reads_through_the_reader() {
    let a = Email {
        address: "Ada@Example.org".into(),
    };
    let b = Email {
        address: "ada@example.org".into(),
    };
    assert_eq!(a, b);
    assert_eq!(a.equivalence_hash(), b.equivalence_hash());
    assert_eq!(Email::SHAPE.lookup("normalized"), Visibility::Protected);

    let mut seen = HashMap::new();
    seen.insert(a, 1);
    assert_eq!(seen.get(&b), Some(&1));
}

equivalence::define! {
    #[derive(Debug)]
    struct Tagged {
        r#type: String,
        alias: String,
    }

    impl Tagged {
        equivalence!(r#type, "@alias");
    }
}

#[equivalence_testhelpers::test]
fn keyword_named_attributes() {
    let a = Tagged {
        r#type: "user".into(),
        alias: "bob".into(),
    };
    let b = Tagged {
        r#type: "user".into(),
        alias: "bob".into(),
    };
    assert_eq!(a, b);
    assert_eq!(a.r#type(), "user");
    assert_eq!(
        Tagged::SHAPE.attribute_names().collect::<Vec<_>>(),
        ["type", "alias"]
    );
}

mod reexport {
    pub use equivalence as eq;
}

equivalence::define! {
    #[equivalence(crate_path = crate::reexport::eq)]
    #[derive(Debug)]
    struct Id {
        value: u64,
    }

    impl Id {
        equivalence!(@value);
    }
}

#[equivalence_testhelpers::test]
fn crate_path_points_at_a_reexport() {
    assert_eq!(Id { value: 7 }, Id { value: 7 });
    assert_eq!(Id::SHAPE.type_name, "Id");
}

equivalence::define! {
    macro_rules! doubled {
        ($e:expr) => {
            $e * 2
        };
    }

    #[derive(Debug)]
    struct Scaled {
        raw: u32,
    }

    impl Scaled {
        equivalence!(scaled);

        fn scaled(&self) -> u32 {
            doubled!(self.raw)
        }
    }
}

#[equivalence_testhelpers::test]
fn macro_rules_items_do_not_hide_the_directive() {
    assert_eq!(Scaled { raw: 2 }, Scaled { raw: 2 });
    assert_ne!(Scaled { raw: 2 }, Scaled { raw: 3 });
    assert_eq!(Scaled::SHAPE.lookup("scaled"), Visibility::Protected);
    assert_eq!(
        Scaled::SHAPE.attribute("scaled").unwrap().origin,
        ReaderOrigin::Raised
    );
}

#[equivalence_testhelpers::test]
fn equality_and_hash_follow_the_attributes() {
    bolero::check!()
        .with_type::<(i32, i32, i32, i32, bool)>()
        .for_each(|&(x1, y1, x2, y2, same)| {
            let (x2, y2) = if same { (x1, y1) } else { (x2, y2) };
            let a = Point::new(x1, y1);
            let b = Point::new(x2, y2);

            assert_eq!(a == b, (x1, y1) == (x2, y2));
            assert_eq!(a.eql(&b), a == b);
            if a == b {
                assert_eq!(a.equivalence_hash(), b.equivalence_hash());
            }
        });
}
