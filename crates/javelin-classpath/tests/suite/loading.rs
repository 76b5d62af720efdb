use std::path::Path;
use std::sync::Arc;

use javelin_classfile::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use javelin_classpath::{ClassLoader, SearchLocation};
use javelin_config::JavelinConfig;
use javelin_test_utils::{init_tracing, write_file, write_jar, ClassFileBuilder, MemberBuilder};
use javelin_types::{ClassOrigin, ClassRef, Modifiers, ResolveError, SymbolProvider};
use pretty_assertions::assert_eq;

use super::support::write_binary;

fn jar_class(internal_name: &str, marker: &str) -> (String, Vec<u8>) {
    let bytes = ClassFileBuilder::new(internal_name)
        .field(MemberBuilder::new(ACC_PUBLIC, marker, "I"))
        .build();
    (format!("{internal_name}.class"), bytes)
}

fn write_jar_classes(path: &Path, classes: &[(String, Vec<u8>)]) {
    let entries: Vec<(&str, Vec<u8>)> = classes
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.clone()))
        .collect();
    write_jar(path, &entries);
}

#[test]
fn first_search_location_shadows_later_ones() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("classes");
    let jar = tmp.path().join("lib/dep.jar");
    write_binary(&dir, "p/Q", "fromDirectory");
    write_jar_classes(&jar, &[jar_class("p/Q", "fromArchive")]);

    let q = ClassRef::from_binary_name("p.Q");
    let mut loader = ClassLoader::new(
        &[
            SearchLocation::Directory(dir.clone()),
            SearchLocation::Archive(jar.clone()),
        ],
        None,
    );
    let decl = loader.load_class(&q).unwrap();
    assert!(decl.field("fromDirectory").is_some());
    assert_eq!(decl.origin, ClassOrigin::Binary(dir.join("p/Q.class")));

    let mut loader = ClassLoader::new(
        &[SearchLocation::Archive(jar.clone()), SearchLocation::Directory(dir)],
        None,
    );
    let decl = loader.load_class(&q).unwrap();
    assert!(decl.field("fromArchive").is_some());
    assert_eq!(decl.origin, ClassOrigin::Binary(jar));
}

#[test]
fn loaded_descriptors_are_cached() {
    let tmp = tempfile::tempdir().unwrap();
    write_binary(tmp.path(), "p/Q", "x");

    let mut loader = ClassLoader::new(&[SearchLocation::Directory(tmp.path().to_path_buf())], None);
    let q = ClassRef::from_binary_name("p.Q");
    let first = loader.load_class(&q).unwrap();
    std::fs::remove_file(tmp.path().join("p/Q.class")).unwrap();
    let second = loader.load_class(&q).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.loaded_count(), 1);
}

#[test]
fn nested_archive_class_is_finalized_by_its_enclosing_class() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("dep.jar");
    let outer = ClassFileBuilder::new("p/Outer")
        .inner_class("p/Outer$Inner", Some("p/Outer"), Some("Inner"), ACC_PRIVATE | ACC_STATIC)
        .build();
    let inner = ClassFileBuilder::new("p/Outer$Inner").build();
    write_jar(
        &jar,
        &[("p/Outer.class", outer), ("p/Outer$Inner.class", inner)],
    );

    let mut loader = ClassLoader::new(&[SearchLocation::Archive(jar)], None);
    let decl = loader
        .load_class(&ClassRef::from_binary_name("p.Outer$Inner"))
        .unwrap();

    assert_eq!(decl.modifiers, Modifiers::PRIVATE | Modifiers::STATIC);
    assert_eq!(loader.loaded_count(), 2);
    assert!(loader.is_compiled("p", "Outer$Inner"));
}

#[test]
fn unreadable_archive_is_treated_as_empty() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let broken = write_file(tmp.path(), "broken.jar", b"not a zip archive");
    let dir = tmp.path().join("classes");
    write_binary(&dir, "p/Q", "x");

    let mut loader = ClassLoader::new(
        &[SearchLocation::Archive(broken), SearchLocation::Directory(dir)],
        None,
    );
    assert_eq!(loader.packages().collect::<Vec<_>>(), ["p"]);
    assert!(loader.load_class(&ClassRef::from_binary_name("p.Q")).is_ok());
}

#[test]
fn binary_declaring_another_class_is_skipped() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("classes");
    let jar = tmp.path().join("lib/dep.jar");
    let misplaced = ClassFileBuilder::new("p/R")
        .field(MemberBuilder::new(ACC_PUBLIC, "fromDirectory", "I"))
        .build();
    write_file(&dir, "p/Q.class", misplaced.clone());
    write_jar_classes(&jar, &[jar_class("p/Q", "fromArchive")]);

    let q = ClassRef::from_binary_name("p.Q");
    let mut loader = ClassLoader::new(
        &[
            SearchLocation::Directory(dir.clone()),
            SearchLocation::Archive(jar),
        ],
        None,
    );
    let decl = loader.load_class(&q).unwrap();
    assert!(decl.field("fromArchive").is_some());
    assert_eq!(loader.loaded_count(), 1);

    let only_jar = tmp.path().join("lib/bad.jar");
    write_jar(&only_jar, &[("p/Q.class", misplaced)]);
    for location in [SearchLocation::Directory(dir), SearchLocation::Archive(only_jar)] {
        let mut loader = ClassLoader::new(&[location], None);
        let err = loader.load_class(&q).unwrap_err();
        assert!(err.is_class_not_found(), "{err}");
        assert_eq!(loader.loaded_count(), 0);
    }
}

#[test]
fn unknown_classes_are_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    write_binary(tmp.path(), "p/Q", "x");
    let mut loader = ClassLoader::new(&[SearchLocation::Directory(tmp.path().to_path_buf())], None);

    for name in ["p.Missing", "nowhere.Q"] {
        let err = loader.load_class(&ClassRef::from_binary_name(name)).unwrap_err();
        assert!(
            matches!(&err, ResolveError::ClassNotFound { name: missing } if missing == name),
            "{err}"
        );
    }
    assert_eq!(loader.loaded_count(), 0);
}

#[test]
fn loader_is_a_symbol_provider() {
    let tmp = tempfile::tempdir().unwrap();
    write_binary(tmp.path(), "p/Q", "x");
    let mut loader = ClassLoader::new(&[SearchLocation::Directory(tmp.path().to_path_buf())], None);

    let provider: &mut dyn SymbolProvider = &mut loader;
    let decl = provider.load_class(&ClassRef::from_binary_name("p.Q")).unwrap();
    assert_eq!(decl.ty.binary_name(), "p.Q");
}

#[test]
fn loader_from_config_searches_configured_class_path() {
    let tmp = tempfile::tempdir().unwrap();
    let classes = tmp.path().join("build/classes");
    write_binary(&classes, "com/example/Widget", "size");
    let config = JavelinConfig::from_toml_str(&format!(
        r#"
[search_path]
class = [{:?}]
"#,
        classes.display().to_string()
    ))
    .unwrap();

    let mut loader = ClassLoader::from_config(&config).unwrap();
    assert_eq!(
        loader.classes_in("com.example").collect::<Vec<_>>(),
        ["Widget"]
    );
    let decl = loader
        .load_class(&ClassRef::from_binary_name("com.example.Widget"))
        .unwrap();
    assert!(decl.field("size").is_some());
}
