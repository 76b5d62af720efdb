use std::rc::Rc;

use javelin_classpath::{ClassLoader, ImportList, SearchLocation};
use javelin_test_utils::DeclBuilder;
use javelin_types::{ClassRef, InnerClassDecl, Modifiers, Type};
use pretty_assertions::assert_eq;

use super::support::{loader_with, write_binary, write_source, RecordingCompiler};

fn class(name: &str) -> Type {
    Type::Class(ClassRef::from_binary_name(name))
}

fn binary_loader(classes: &[&str]) -> (tempfile::TempDir, ClassLoader) {
    let tmp = tempfile::tempdir().unwrap();
    for internal_name in classes {
        write_binary(tmp.path(), internal_name, "x");
    }
    let loader = ClassLoader::new(&[SearchLocation::Directory(tmp.path().to_path_buf())], None);
    (tmp, loader)
}

#[test]
fn imports_are_tried_in_order() {
    let (_tmp, mut loader) = binary_loader(&[
        "com/example/Local",
        "com/example/Helper",
        "util/Helper",
        "util/Tool",
        "java/lang/String",
    ]);
    let imports = ImportList::for_compilation_unit("com.example", &["util.Helper"], &["util"]);

    let resolve = |loader: &mut ClassLoader, name: &str| {
        loader
            .resolve(name, &imports)
            .map(|found| found.binary_name())
    };
    // A single-type import beats the unit's own package.
    assert_eq!(resolve(&mut loader, "Helper").unwrap(), "util.Helper");
    assert_eq!(resolve(&mut loader, "Local").unwrap(), "com.example.Local");
    assert_eq!(resolve(&mut loader, "Tool").unwrap(), "util.Tool");
    assert_eq!(resolve(&mut loader, "String").unwrap(), "java.lang.String");
    assert!(resolve(&mut loader, "Missing").unwrap_err().is_class_not_found());
}

#[test]
fn package_prefix_may_name_an_outer_class() {
    let (_tmp, mut loader) = binary_loader(&["com/example/Outer", "com/example/Outer$Inner"]);

    let found = loader
        .resolve_class_name("com.example.Outer", "Inner")
        .unwrap()
        .unwrap();
    assert_eq!(found.binary_name(), "com.example.Outer$Inner");
    assert_eq!(found.class_name(), "Outer$Inner");

    assert_eq!(loader.resolve_class_name("com.example.Outer", "Nope").unwrap(), None);
    assert_eq!(loader.resolve_class_name("org", "Outer").unwrap(), None);
}

#[test]
fn single_type_import_of_outer_class_reaches_nested_class() {
    let (_tmp, mut loader) = binary_loader(&["com/example/Outer", "com/example/Outer$Inner"]);

    let found = loader
        .resolve("Outer.Inner", &["com.example.Outer"])
        .unwrap();
    assert_eq!(found.binary_name(), "com.example.Outer$Inner");

    let found = loader.resolve("Inner", &["com.example.Outer.*"]).unwrap();
    assert_eq!(found.binary_name(), "com.example.Outer$Inner");
}

#[test]
fn nested_class_lookup_compiles_outer_source_first() {
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "com/example/Outer.java");

    let mut outer = DeclBuilder::class("com.example.Outer").build();
    outer.inner_classes.push(InnerClassDecl {
        ty: ClassRef::from_binary_name("com.example.Outer$Inner"),
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
        is_anonymous: false,
    });
    let compiler = Rc::new(RecordingCompiler::new().produces(
        "com.example.Outer",
        vec![outer, DeclBuilder::class("com.example.Outer$Inner").build()],
    ));
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);
    assert_eq!(loader.classes_in("com.example").collect::<Vec<_>>(), ["Outer"]);

    let found = loader
        .resolve_class_name("com.example.Outer", "Inner")
        .unwrap()
        .unwrap();
    assert_eq!(found.binary_name(), "com.example.Outer$Inner");
    assert_eq!(compiler.compiled(), ["com.example.Outer"]);
    assert_eq!(
        loader.classes_in("com.example").collect::<Vec<_>>(),
        ["Outer", "Outer$Inner"]
    );

    // Known and compiled now: no second compile.
    loader.resolve_class_name("com.example", "Outer.Inner").unwrap();
    assert_eq!(compiler.compiled(), ["com.example.Outer"]);
}

#[test]
fn resolve_type_qualifies_default_package_references() {
    let (_tmp, mut loader) = binary_loader(&[
        "com/example/Local",
        "com/example/Outer",
        "com/example/Outer$Inner",
        "util/Helper",
    ]);
    let imports = ImportList::for_compilation_unit::<&str>("com.example", &["util.Helper"], &[]);

    let unresolved = Type::array(Type::Class(
        ClassRef::from_binary_name("Helper").with_args(vec![class("Local"), Type::type_var("T")]),
    ));
    assert_eq!(
        loader.resolve_type(&unresolved, &imports).unwrap(),
        Type::array(Type::Class(
            ClassRef::from_binary_name("util.Helper")
                .with_args(vec![class("com.example.Local"), Type::type_var("T")])
        ))
    );

    assert_eq!(
        loader.resolve_type(&class("Outer$Inner"), &imports).unwrap(),
        class("com.example.Outer$Inner")
    );
    // Already qualified references are left alone.
    assert_eq!(
        loader.resolve_type(&class("util.Helper"), &imports).unwrap(),
        class("util.Helper")
    );
}

#[test]
fn resolve_decl_fails_on_first_unknown_name() {
    let (_tmp, mut loader) = binary_loader(&["com/example/Local"]);
    let imports = ImportList::for_compilation_unit::<&str>("com.example", &[], &[]);

    let decl = DeclBuilder::class("com.example.Widget")
        .field("local", class("Local"))
        .method("make", vec![Type::INT], class("Local"))
        .build();
    let resolved = loader.resolve_decl(&decl, &imports).unwrap();
    assert_eq!(resolved.fields[0].ty, class("com.example.Local"));
    assert_eq!(
        resolved.methods[0].signature.return_type,
        class("com.example.Local")
    );

    let broken = DeclBuilder::class("com.example.Broken")
        .field("gone", class("Gone"))
        .build();
    assert!(loader
        .resolve_decl(&broken, &imports)
        .unwrap_err()
        .is_class_not_found());
}
