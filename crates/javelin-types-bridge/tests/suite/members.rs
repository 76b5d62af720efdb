use std::path::Path;

use javelin_classfile::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC, ACC_SYNTHETIC, ACC_VARARGS};
use javelin_test_utils::{ClassFileBuilder, MemberBuilder};
use javelin_types::{
    ClassOrigin, ClassRef, Modifiers, Nullness, PrimitiveType, Type, TypeVar, Wildcard,
};
use javelin_types_bridge::read_class;
use pretty_assertions::assert_eq;

fn class(name: &str) -> ClassRef {
    ClassRef::from_binary_name(name)
}

#[test]
fn generic_signatures_win_over_descriptors() {
    let bytes = ClassFileBuilder::new("com/example/Box")
        .signature("<T:Ljava/lang/Number;>Ljava/lang/Object;Ljava/lang/Comparable<TT;>;")
        .interface("java/lang/Comparable")
        .field(MemberBuilder::new(ACC_PUBLIC, "value", "Ljava/lang/Number;").signature("TT;"))
        .method(
            MemberBuilder::new(ACC_PUBLIC, "copy", "(Ljava/util/List;)Ljava/util/List;")
                .signature("<U:Ljava/lang/Object;>(Ljava/util/List<+TT;>;)Ljava/util/List<TU;>;"),
        )
        .build();

    let decl = read_class(&bytes, Path::new("lib/box.jar"))
        .unwrap()
        .finalize(None);

    let t = Type::TypeVar(TypeVar::bounded("T", Type::Class(class("java.lang.Number"))));
    assert_eq!(decl.ty, class("com.example.Box").with_args(vec![t.clone()]));
    assert_eq!(decl.super_type, Some(ClassRef::object()));
    assert_eq!(
        decl.interfaces,
        vec![class("java.lang.Comparable").with_args(vec![t.clone()])]
    );
    assert_eq!(decl.field("value").unwrap().ty, t);
    assert_eq!(decl.origin, ClassOrigin::Binary("lib/box.jar".into()));

    let copy = decl.methods_named("copy").next().unwrap();
    assert_eq!(
        copy.signature.params,
        vec![Type::Class(
            class("java.util.List").with_args(vec![Type::Wildcard(Wildcard::extends(t))])
        )]
    );
    assert_eq!(
        copy.signature.return_type,
        Type::Class(class("java.util.List").with_args(vec![Type::type_var("U")]))
    );
}

#[test]
fn varargs_exceptions_and_nullness() {
    let bytes = ClassFileBuilder::new("com/example/Io")
        .method(
            MemberBuilder::new(ACC_PUBLIC | ACC_STATIC | ACC_VARARGS, "join", "([Ljava/lang/String;)Ljava/lang/String;")
                .throws("java/io/IOException")
                .annotation("Ljavax/annotation/Nonnull;"),
        )
        .field(
            MemberBuilder::new(ACC_PUBLIC, "name", "Ljava/lang/String;")
                .annotation("Lorg/jetbrains/annotations/Nullable;"),
        )
        .field(MemberBuilder::new(ACC_PUBLIC, "count", "I"))
        .method(MemberBuilder::new(ACC_SYNTHETIC, "access$000", "()V"))
        .method(MemberBuilder::new(ACC_STATIC, "<clinit>", "()V"))
        .build();

    let decl = read_class(&bytes, Path::new("out")).unwrap().finalize(None);
    assert_eq!(decl.methods.len(), 1);

    let join = &decl.methods[0];
    assert!(join.is_variable_arity);
    assert_eq!(join.thrown, vec![class("java.io.IOException")]);
    assert_eq!(join.signature.return_type.attrs().nullness, Nullness::NonNull);
    assert_eq!(
        join.signature.params,
        vec![Type::array(Type::Class(class("java.lang.String")))]
    );

    assert_eq!(decl.field("name").unwrap().ty.attrs().nullness, Nullness::Nullable);
    assert_eq!(
        decl.field("count").unwrap().ty,
        Type::Primitive(PrimitiveType::Int)
    );
}

#[test]
fn interfaces_extend_the_root_type() {
    let bytes = ClassFileBuilder::new("com/example/Shape")
        .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
        .build();
    let decl = read_class(&bytes, Path::new("out")).unwrap().finalize(None);
    assert!(decl.is_interface());
    assert_eq!(decl.super_type, Some(ClassRef::object()));

    let object = ClassFileBuilder::new("java/lang/Object").super_class(None).build();
    let decl = read_class(&object, Path::new("rt")).unwrap().finalize(None);
    assert_eq!(decl.super_type, None);
    assert_eq!(decl.modifiers, Modifiers::PUBLIC);
}

#[test]
fn malformed_signature_falls_back_to_descriptor() {
    let bytes = ClassFileBuilder::new("com/example/Odd")
        .field(MemberBuilder::new(ACC_PUBLIC, "xs", "Ljava/util/List;").signature("Ljava/util/List<"))
        .build();
    let decl = read_class(&bytes, Path::new("out")).unwrap().finalize(None);
    assert_eq!(decl.field("xs").unwrap().ty, Type::Class(class("java.util.List")));
}

#[test]
fn constructor_signature_without_outer_instance_uses_descriptor() {
    let bytes = ClassFileBuilder::new("com/example/Outer$Inner")
        .method(
            MemberBuilder::new(ACC_PUBLIC, "<init>", "(Lcom/example/Outer;Ljava/util/List;)V")
                .signature("(Ljava/util/List<Ljava/lang/String;>;)V"),
        )
        .build();
    let decl = read_class(&bytes, Path::new("out")).unwrap().finalize(None);
    let ctor = &decl.methods[0];
    assert!(ctor.is_constructor());
    assert_eq!(ctor.signature.params.len(), 2);
}

#[test]
fn garbage_bytes_are_an_internal_error() {
    let err = read_class(b"not a class", Path::new("lib/bad.jar")).unwrap_err();
    assert!(err.to_string().contains("lib/bad.jar"), "{err}");
}
