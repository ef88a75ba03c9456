//! Tests for structure values and the structural-update operation.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use rill_ir::{Name, NodeId, StringInterner, TypeTag};

use crate::exception::ExceptionKind;
use crate::value::{LayoutField, StructDefValue, Value};

fn field(interner: &StringInterner, text: &str, ty: TypeTag) -> LayoutField {
    let name = interner.intern(text);
    LayoutField::new(name, interner.resolve(name), ty)
}

/// `•Test(n•#)`
fn test_def(interner: &StringInterner) -> StructDefValue {
    let name = interner.intern("Test");
    StructDefValue::new(
        NodeId::new(0),
        name,
        interner.resolve(name),
        vec![field(interner, "n", TypeTag::Number)],
        vec![],
    )
}

fn path(interner: &StringInterner, segments: &[&str]) -> Vec<(Name, &'static str)> {
    segments
        .iter()
        .map(|s| {
            let name = interner.intern(s);
            (name, interner.resolve(name))
        })
        .collect()
}

#[test]
fn test_evolve_replaces_field() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let n = path(&interner, &["n"]);

    // b: Test(1).n: 2 ... b.n = 2
    let a = def.instantiate(vec![Value::number(1.0)]).unwrap();
    let b = a.evolve(&n, Value::number(2.0)).unwrap();
    assert_eq!(b.get(n[0].0), Some(&Value::number(2.0)));
}

#[test]
fn test_evolve_leaves_source_unchanged() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let n = path(&interner, &["n"]);

    let a = def.instantiate(vec![Value::number(1.0)]).unwrap();
    let _ = a.evolve(&n, Value::number(2.0)).unwrap();
    assert_eq!(a.get(n[0].0), Some(&Value::number(1.0)));
}

#[test]
fn test_chained_evolve_composes() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let n = path(&interner, &["n"]);

    // b2: (Test(1).n: 2).n: 3 ... b2.n = 3
    let a = def.instantiate(vec![Value::number(1.0)]).unwrap();
    let b = a.evolve(&n, Value::number(2.0)).unwrap();
    let b2 = b.evolve(&n, Value::number(3.0)).unwrap();
    assert_eq!(b2.get(n[0].0), Some(&Value::number(3.0)));
    assert_eq!(b.get(n[0].0), Some(&Value::number(2.0)));
    assert_eq!(a.get(n[0].0), Some(&Value::number(1.0)));
}

#[test]
fn test_nested_evolve() {
    let interner = StringInterner::new();
    let inner_def = test_def(&interner);
    let outer_name = interner.intern("Outer");
    let outer_def = StructDefValue::new(
        NodeId::new(1),
        outer_name,
        interner.resolve(outer_name),
        vec![field(
            &interner,
            "inner",
            TypeTag::Structure(interner.intern("Test")),
        )],
        vec![],
    );

    let inner = inner_def.instantiate(vec![Value::number(1.0)]).unwrap();
    let outer = outer_def
        .instantiate(vec![Value::structure(inner.clone())])
        .unwrap();

    let inner_n = path(&interner, &["inner", "n"]);
    let evolved = outer.evolve(&inner_n, Value::number(7.0)).unwrap();

    let names: Vec<Name> = inner_n.iter().map(|(n, _)| *n).collect();
    assert_eq!(evolved.get_path(&names), Some(&Value::number(7.0)));
    // The prior outer still holds the prior inner.
    assert_eq!(outer.get_path(&names), Some(&Value::number(1.0)));
    assert_eq!(inner.get(interner.intern("n")), Some(&Value::number(1.0)));
}

#[test]
fn test_evolve_unknown_field() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let a = def.instantiate(vec![Value::number(1.0)]).unwrap();
    let err = a
        .evolve(&path(&interner, &["missing"]), Value::number(2.0))
        .unwrap_err();
    assert!(matches!(err.kind, ExceptionKind::UnboundName { .. }));
}

#[test]
fn test_evolve_declared_type_mismatch() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let a = def.instantiate(vec![Value::number(1.0)]).unwrap();
    let err = a
        .evolve(&path(&interner, &["n"]), Value::text("two"))
        .unwrap_err();
    assert!(matches!(err.kind, ExceptionKind::TypeMismatch { .. }));
}

#[test]
fn test_instantiate_missing_input() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    let err = def.instantiate(vec![]).unwrap_err();
    assert_eq!(err.kind, ExceptionKind::MissingInput { name: "n".into() });
}

#[test]
fn test_instantiate_checks_declared_type() {
    let interner = StringInterner::new();
    let def = test_def(&interner);
    assert!(def.instantiate(vec![Value::bool(true)]).is_err());
}

proptest! {
    /// Evolve independence: for any pair of magnitudes, evolving never
    /// disturbs the source and the last write wins.
    #[test]
    fn prop_evolve_independence(initial in -1.0e9_f64..1.0e9, v1 in -1.0e9_f64..1.0e9, v2 in -1.0e9_f64..1.0e9) {
        let interner = StringInterner::new();
        let def = test_def(&interner);
        let n = path(&interner, &["n"]);

        let a = def.instantiate(vec![Value::number(initial)]).unwrap();
        let b = a.evolve(&n, Value::number(v1)).unwrap();
        let c = b.evolve(&n, Value::number(v2)).unwrap();

        prop_assert_eq!(a.get(n[0].0), Some(&Value::number(initial)));
        prop_assert_eq!(b.get(n[0].0), Some(&Value::number(v1)));
        prop_assert_eq!(c.get(n[0].0), Some(&Value::number(v2)));
    }
}
