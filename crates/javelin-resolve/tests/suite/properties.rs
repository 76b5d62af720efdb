//! Algebraic properties checked over a fixed sample of types.

use javelin_resolve::ClassTable;
use javelin_test_utils::{DeclBuilder, MemoryProvider};
use javelin_types::{
    Binding, ClassRef, PrimitiveType, Type, TypeAttrs, TypeVar, Wildcard,
};
use pretty_assertions::assert_eq;

fn class(name: &str) -> Type {
    Type::Class(ClassRef::from_binary_name(name))
}

fn generic(name: &str, args: Vec<Type>) -> Type {
    Type::Class(ClassRef::from_binary_name(name).with_args(args))
}

fn sample() -> Vec<Type> {
    let mut out: Vec<Type> = PrimitiveType::ALL.into_iter().map(Type::Primitive).collect();
    out.extend([
        Type::object(),
        class("java.lang.String"),
        class("java.lang.Integer"),
        class("java.lang.Number"),
        class("java.util.List"),
        generic("java.util.List", vec![class("java.lang.String")]),
        generic("java.util.List", vec![Type::Wildcard(Wildcard::unbounded())]),
        generic(
            "java.util.List",
            vec![Type::Wildcard(Wildcard::extends(class("java.lang.Number")))],
        ),
        generic(
            "java.util.List",
            vec![Type::Wildcard(Wildcard::super_of(class("java.lang.Integer")))],
        ),
        generic(
            "java.util.Map$Entry",
            vec![Type::type_var("K"), Type::type_var("V")],
        ),
        Type::array(Type::INT),
        Type::array(class("java.lang.String")),
        Type::array(Type::array(Type::object())),
        Type::type_var("T"),
        Type::TypeVar(TypeVar::bounded("N", class("java.lang.Number"))),
        Type::Wildcard(Wildcard::unbounded()),
        Type::Wildcard(Wildcard::extends(class("java.lang.Number"))),
        Type::Intersection(vec![
            ClassRef::from_binary_name("java.lang.Number"),
            ClassRef::from_binary_name("java.io.Serializable"),
        ]),
        class("java.lang.String").with_attrs(TypeAttrs::NULLABLE),
    ]);
    out
}

#[test]
fn containment_is_reflexive_and_antisymmetric() {
    let types = sample();
    for a in &types {
        assert!(a.supset_eq_of(a), "{a} is not reflexive");
        for b in &types {
            if a.supset_eq_of(b) && b.supset_eq_of(a) {
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn subtyping_is_reflexive() {
    let mut provider = MemoryProvider::with_builtins();
    provider.insert(DeclBuilder::interface("java.util.List").type_param("E").build());
    let mut table = ClassTable::new(provider);
    for ty in sample() {
        assert!(table.is_subtype(&ty, &ty).unwrap(), "{ty}");
    }
}

#[test]
fn empty_substitution_is_identity() {
    let empty = Binding::new();
    for ty in sample() {
        let substituted = ty.substitute(&empty);
        assert_eq!(substituted, ty);
        assert_eq!(substituted.attrs(), ty.attrs());
    }
}

#[test]
fn attribute_union_is_idempotent() {
    for ty in sample() {
        let joined = ty.union(&ty);
        assert_eq!(joined, ty);
        assert_eq!(joined.attrs(), ty.attrs());
    }
}

#[test]
fn upper_bound_is_symmetric_and_idempotent() {
    let mut table = ClassTable::new(MemoryProvider::with_builtins());
    let classes: Vec<ClassRef> = [
        "java.lang.Object",
        "java.lang.String",
        "java.lang.CharSequence",
        "java.lang.Integer",
        "java.lang.Long",
        "java.lang.Boolean",
        "java.lang.Number",
        "java.io.Serializable",
    ]
    .into_iter()
    .map(ClassRef::from_binary_name)
    .collect();

    for a in &classes {
        assert_eq!(&table.common_super_type(a, a).unwrap(), a);
        for b in &classes {
            let ab = table.common_super_type(a, b).unwrap();
            let ba = table.common_super_type(b, a).unwrap();
            assert_eq!(ab, ba, "lub({a}, {b})");
        }
    }

    let comparable = ClassRef::from_binary_name("java.lang.Comparable")
        .with_args(vec![class("java.lang.Integer")]);
    assert_eq!(
        table.common_super_type(&comparable, &comparable).unwrap(),
        comparable
    );
}
