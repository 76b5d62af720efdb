use javelin_resolve::ClassTable;
use javelin_test_utils::{DeclBuilder, MemoryProvider};
use javelin_types::{ClassRef, Nullness, Type, TypeAttrs, Wildcard};
use pretty_assertions::assert_eq;

fn class(name: &str) -> ClassRef {
    ClassRef::from_binary_name(name)
}

fn table() -> ClassTable<MemoryProvider> {
    let mut provider = MemoryProvider::with_builtins();
    provider.insert(DeclBuilder::interface("java.util.List").type_param("E").build());
    provider.insert(
        DeclBuilder::class("java.util.ArrayList")
            .type_param("E")
            .implements(class("java.util.List").with_args(vec![Type::type_var("E")]))
            .build(),
    );
    provider.insert(DeclBuilder::class("p.Cell").type_param("T").build());
    for (name, arg) in [
        ("p.IntCell", "java.lang.Integer"),
        ("p.NumCell", "java.lang.Number"),
        ("p.StrCell", "java.lang.String"),
    ] {
        provider.insert(
            DeclBuilder::class(name)
                .extends(class("p.Cell").with_args(vec![class(arg).into()]))
                .build(),
        );
    }
    ClassTable::new(provider)
}

/// Computes the bound both ways round and checks they agree.
fn lub(table: &mut ClassTable<MemoryProvider>, a: &ClassRef, b: &ClassRef) -> ClassRef {
    let ab = table.common_super_type(a, b).unwrap();
    let ba = table.common_super_type(b, a).unwrap();
    assert!(ab.eq_with_attrs(&ba), "{ab} vs {ba}");
    ab
}

#[test]
fn unrelated_classes_meet_at_nearest_common_superclass() {
    let mut table = table();
    assert_eq!(
        lub(&mut table, &class("java.lang.Integer"), &class("java.lang.Long")),
        class("java.lang.Number")
    );
    assert_eq!(
        lub(&mut table, &class("java.lang.String"), &class("java.lang.Integer")),
        ClassRef::object()
    );
}

#[test]
fn supertype_of_the_other_side_is_the_bound() {
    let mut table = table();
    assert_eq!(
        lub(&mut table, &class("java.lang.Integer"), &class("java.lang.Number")),
        class("java.lang.Number")
    );
    assert_eq!(
        lub(&mut table, &class("java.lang.String"), &class("java.lang.CharSequence")),
        class("java.lang.CharSequence")
    );

    let strings = class("java.util.ArrayList").with_args(vec![class("java.lang.String").into()]);
    let list_of_strings = class("java.util.List").with_args(vec![class("java.lang.String").into()]);
    assert_eq!(lub(&mut table, &strings, &list_of_strings), list_of_strings);
    // A raw side adopts the other side's arguments.
    assert_eq!(
        lub(&mut table, &strings, &class("java.util.List")),
        list_of_strings
    );
}

#[test]
fn type_arguments_are_reconciled() {
    let mut table = table();
    let cell_of = |arg: Type| class("p.Cell").with_args(vec![arg]);

    assert_eq!(
        lub(&mut table, &class("p.IntCell"), &class("p.NumCell")),
        cell_of(Type::Class(class("java.lang.Integer")))
    );
    assert_eq!(
        lub(&mut table, &class("p.IntCell"), &class("p.StrCell")),
        cell_of(Type::Wildcard(Wildcard::unbounded()))
    );
}

#[test]
fn attributes_of_both_sides_are_joined() {
    let mut table = table();
    let non_null = class("java.lang.Integer").with_attrs(TypeAttrs::NON_NULL);
    let nullable = class("java.lang.Long").with_attrs(TypeAttrs::NULLABLE);

    let bound = lub(&mut table, &non_null, &nullable);
    assert_eq!(bound, class("java.lang.Number"));
    assert_eq!(bound.attrs.nullness, Nullness::Nullable);

    let both = lub(&mut table, &non_null, &non_null.clone());
    assert!(both.eq_with_attrs(&non_null));
}
