use std::rc::Rc;

use javelin_classpath::{ClassLoader, CommandCompiler, CompileState, SearchLocation, SourceCompiler};
use javelin_test_utils::{init_tracing, javac_available, write_file, DeclBuilder};
use javelin_types::{ClassOrigin, ClassRef, InnerClassDecl, Modifiers, Type};
use pretty_assertions::assert_eq;

use super::support::{loader_with, touch, write_binary, write_source, RecordingCompiler};

#[test]
fn newer_source_is_recompiled_instead_of_reading_stale_binary() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "p/Q.java");
    let binary = write_binary(tmp.path(), "p/Q", "stale");
    touch(&binary, 0);
    touch(&source, 10);

    let compiler = Rc::new(RecordingCompiler::new().produces(
        "p.Q",
        vec![
            DeclBuilder::class("p.Q").field("fresh", Type::INT).build(),
            DeclBuilder::class("p.Q$Helper").build(),
        ],
    ));
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    let decl = loader.load_class(&ClassRef::from_binary_name("p.Q")).unwrap();
    assert!(decl.field("fresh").is_some());
    assert!(decl.field("stale").is_none());
    assert_eq!(decl.origin, ClassOrigin::Source(source.clone()));
    assert_eq!(compiler.compiled(), ["p.Q"]);

    // Everything the compile produced is registered.
    assert_eq!(loader.loaded_count(), 2);
    assert!(loader.is_compiled("p", "Q$Helper"));
    assert_eq!(loader.compile_state(&source), CompileState::Done);
}

#[test]
fn newer_binary_is_read_without_compiling() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "p/Q.java");
    let binary = write_binary(tmp.path(), "p/Q", "current");
    touch(&source, 0);
    touch(&binary, 10);

    let compiler = Rc::new(RecordingCompiler::new());
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    assert!(loader.is_compiled("p", "Q"));
    let decl = loader.load_class(&ClassRef::from_binary_name("p.Q")).unwrap();
    assert!(decl.field("current").is_some());
    assert!(compiler.compiled().is_empty());
}

#[test]
fn stale_binary_is_read_when_no_compiler_is_configured() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "p/Q.java");
    let binary = write_binary(tmp.path(), "p/Q", "stale");
    write_source(tmp.path(), "p/Only.java");
    touch(&binary, 0);
    touch(&source, 10);

    let mut loader = ClassLoader::new(&[SearchLocation::Directory(tmp.path().to_path_buf())], None);
    let decl = loader.load_class(&ClassRef::from_binary_name("p.Q")).unwrap();
    assert!(decl.field("stale").is_some());
    assert_eq!(loader.compile_state(&source), CompileState::NotStarted);

    let err = loader
        .load_class(&ClassRef::from_binary_name("p.Only"))
        .unwrap_err();
    assert!(err.is_class_not_found(), "{err}");
}

#[test]
fn source_without_binary_is_compiled() {
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "Main.java");

    let compiler = Rc::new(
        RecordingCompiler::new().produces("Main", vec![DeclBuilder::class("Main").build()]),
    );
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    assert!(!loader.is_compiled("", "Main"));
    loader.load_class(&ClassRef::from_binary_name("Main")).unwrap();
    assert_eq!(compiler.compiled(), ["Main"]);
    assert!(loader.is_compiled("", "Main"));
}

#[test]
fn compile_without_output_moves_on_to_next_location() {
    let tmp = tempfile::tempdir().unwrap();
    let sources = tmp.path().join("src");
    let classes = tmp.path().join("classes");
    write_source(&sources, "p/Q.java");
    write_binary(&classes, "p/Q", "fromClasses");

    let compiler = Rc::new(RecordingCompiler::new());
    let mut loader = loader_with(
        &[
            SearchLocation::Directory(sources),
            SearchLocation::Directory(classes),
        ],
        &compiler,
    );

    let q = ClassRef::from_binary_name("p.Q");
    let decl = loader.load_class(&q).unwrap();
    assert!(decl.field("fromClasses").is_some());
    loader.load_class(&q).unwrap();
    assert_eq!(compiler.compiled(), ["p.Q"]);
}

#[test]
fn each_source_is_compiled_at_most_once() {
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "p/Q.java");

    let compiler = Rc::new(RecordingCompiler::new());
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    let q = ClassRef::from_binary_name("p.Q");
    assert!(loader.load_class(&q).unwrap_err().is_class_not_found());
    assert!(loader.load_class(&q).unwrap_err().is_class_not_found());
    assert_eq!(compiler.compiled(), ["p.Q"]);
}

#[test]
fn reentrant_compile_of_same_source_yields_nothing() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "p/A.java");
    write_source(tmp.path(), "p/B.java");

    // A refers to B and B refers back to A.
    let compiler = Rc::new(
        RecordingCompiler::new()
            .produces("p.A", vec![DeclBuilder::class("p.A").build()])
            .produces("p.B", vec![DeclBuilder::class("p.B").build()])
            .loads_during("p.A", "p.B")
            .loads_during("p.B", "p.A"),
    );
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    loader.load_class(&ClassRef::from_binary_name("p.A")).unwrap();
    assert_eq!(compiler.compiled(), ["p.A", "p.B"]);
    assert_eq!(
        compiler.nested_loads(),
        [("p.A".to_string(), false), ("p.B".to_string(), true)]
    );
    assert_eq!(loader.loaded_count(), 2);
}

#[test]
fn compiled_nested_class_takes_modifiers_from_enclosing_class() {
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "p/Outer.java");

    let mut outer = DeclBuilder::class("p.Outer").build();
    outer.inner_classes.push(InnerClassDecl {
        ty: ClassRef::from_binary_name("p.Outer$Inner"),
        modifiers: Modifiers::PROTECTED | Modifiers::STATIC,
        is_anonymous: false,
    });
    // Listed nested-first to show publication order does not depend on output order.
    let compiler = Rc::new(RecordingCompiler::new().produces(
        "p.Outer",
        vec![DeclBuilder::class("p.Outer$Inner").build(), outer],
    ));
    let mut loader = loader_with(&[SearchLocation::Directory(tmp.path().to_path_buf())], &compiler);

    let inner = loader
        .load_class(&ClassRef::from_binary_name("p.Outer$Inner"))
        .unwrap();
    assert_eq!(inner.modifiers, Modifiers::PROTECTED | Modifiers::STATIC);
    assert_eq!(compiler.compiled(), ["p.Outer"]);
}

#[test]
fn command_compiler_runs_javac() {
    if !javac_available() {
        eprintln!("skipping: javac not found");
        return;
    }
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    write_file(
        &src,
        "com/example/Greeter.java",
        "package com.example;\n\
         public class Greeter {\n\
             public String greeting;\n\
             public static class Name { public int length; }\n\
         }\n",
    );

    let compiler: Rc<dyn SourceCompiler> = Rc::new(CommandCompiler::new("javac", out));
    let mut loader = ClassLoader::new(&[SearchLocation::Directory(src.clone())], Some(compiler));

    let name = loader
        .load_class(&ClassRef::from_binary_name("com.example.Greeter$Name"))
        .unwrap();
    assert!(name.field("length").is_some());
    assert_eq!(name.modifiers, Modifiers::PUBLIC | Modifiers::STATIC);
    assert_eq!(
        name.origin,
        ClassOrigin::Source(src.join("com/example/Greeter.java"))
    );

    let greeter = loader
        .load_class(&ClassRef::from_binary_name("com.example.Greeter"))
        .unwrap();
    assert_eq!(
        greeter.field("greeting").map(|f| f.ty.clone()),
        Some(Type::Class(ClassRef::from_binary_name("java.lang.String")))
    );
}
