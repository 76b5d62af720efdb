use javelin_classfile::{
    parse_method_signature, ClassFile, Error, InnerClassInfo, ACC_PUBLIC, ACC_STATIC,
    ACC_VARARGS,
};
use javelin_test_utils::{ClassFileBuilder, MemberBuilder};
use pretty_assertions::assert_eq;

#[test]
fn reads_header_members_and_attributes() {
    let bytes = ClassFileBuilder::new("com/example/Box")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<TT;>;")
        .interface("java/lang/Comparable")
        .field(
            MemberBuilder::new(ACC_PUBLIC, "value", "Ljava/lang/Object;")
                .signature("TT;")
                .annotation("Ljavax/annotation/Nullable;"),
        )
        .method(
            MemberBuilder::new(ACC_PUBLIC | ACC_VARARGS, "of", "([Ljava/lang/Object;)V")
                .throws("java/io/IOException"),
        )
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(class.this_class, "com/example/Box");
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(class.interfaces, vec!["java/lang/Comparable".to_string()]);
    assert!(class.signature.is_some());

    let field = &class.fields[0];
    assert_eq!(field.name, "value");
    assert_eq!(field.signature.as_deref(), Some("TT;"));
    assert_eq!(field.annotations[0].simple_name(), Some("Nullable"));

    let method = &class.methods[0];
    assert_eq!(method.access_flags & ACC_VARARGS, ACC_VARARGS);
    assert_eq!(method.exceptions, vec!["java/io/IOException".to_string()]);
    assert!(method.signature.is_none());
}

#[test]
fn own_inner_class_entry_is_found() {
    let bytes = ClassFileBuilder::new("com/example/Outer$Inner")
        .inner_class(
            "com/example/Outer$Inner",
            Some("com/example/Outer"),
            Some("Inner"),
            ACC_STATIC,
        )
        .build();

    let class = ClassFile::parse(&bytes).unwrap();
    assert_eq!(
        class.own_inner_class_entry(),
        Some(&InnerClassInfo {
            inner_class: "com/example/Outer$Inner".to_string(),
            outer_class: Some("com/example/Outer".to_string()),
            inner_name: Some("Inner".to_string()),
            access_flags: ACC_STATIC,
        })
    );
}

#[test]
fn root_class_has_no_super_class() {
    let bytes = ClassFileBuilder::new("java/lang/Object")
        .super_class(None)
        .build();
    assert_eq!(ClassFile::parse(&bytes).unwrap().super_class, None);
}

#[test]
fn rejects_bad_magic_and_truncation() {
    let mut bytes = ClassFileBuilder::new("Foo").build();
    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(ClassFile::parse(truncated), Err(Error::UnexpectedEof)));

    bytes[0] = 0;
    assert!(matches!(ClassFile::parse(&bytes), Err(Error::InvalidMagic(_))));
}

#[test]
fn method_signature_parses_generic_throws() {
    let sig = parse_method_signature("<X:Ljava/lang/Throwable;>()V^TX;").unwrap();
    assert_eq!(sig.throws.len(), 1);
}
