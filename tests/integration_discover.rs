use resource_discovery::{
    discover, DiscoverError, ImportTable, NoMatch, ResourceDiscoverer, TypeDescriptor,
    WalkOptions,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const SCHEMA_FILE: &str = r#"
package graph

import "github.com/acme/graph/schema"

var Person = schema.NodeType{
	Name: "Person",
}

var WorksFor schema.RelationshipType = schema.RelationshipType{
	Name: "WORKS_FOR",
	From: Person,
}

var normalVar = "hello"
"#;

fn write<P: AsRef<Path>>(path: P, code: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, code).unwrap();
}

/// Matches `schema.*Type` where `schema` is imported from an `/schema` path.
fn schema_classifier(descriptor: &TypeDescriptor, imports: &ImportTable) -> Option<String> {
    let path = imports.get(&descriptor.qualifier)?;
    if path.ends_with("/schema") && descriptor.name.ends_with("Type") {
        Some(format!("schema.{}", descriptor.name))
    } else {
        None
    }
}

/// Matches the unqualified `Kind` type.
fn kind_classifier(descriptor: &TypeDescriptor, _imports: &ImportTable) -> Option<String> {
    (!descriptor.is_qualified() && descriptor.name == "Kind").then(|| "Kind".to_string())
}

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

#[test]
fn discovers_schema_resources_and_tracks_every_name() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("schema.go");
    write(&file, SCHEMA_FILE);

    let result = discover(&[dir.path()], &WalkOptions::default(), &schema_classifier);

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let found: Vec<(&str, &str)> = result
        .resources
        .iter()
        .map(|r| (r.name.as_str(), r.kind.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Person", "schema.NodeType"),
            ("WorksFor", "schema.RelationshipType")
        ]
    );
    assert_eq!(names(&result.known_names), vec!["Person", "WorksFor", "normalVar"]);

    let works_for = result.resource("WorksFor").unwrap();
    assert_eq!(works_for.file, file);
    assert_eq!(works_for.line, 10);
    assert_eq!(works_for.dependencies, vec!["Person".to_string()]);
    assert_eq!(result.resource("Person").unwrap().line, 6);
}

#[test]
fn earlier_declarations_become_dependencies() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path().join("infra.go"),
        "package infra\n\nvar A = &Kind{}\nvar B = &Kind{Ref: A}\n",
    );

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert_eq!(result.resource("A").unwrap().dependencies, Vec::<String>::new());
    assert_eq!(
        result.resource("B").unwrap().dependencies,
        vec!["A".to_string()]
    );
}

#[test]
fn forward_references_are_invisible() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path().join("infra.go"),
        "package infra\n\nvar A = &Kind{Ref: B}\nvar B = &Kind{}\n",
    );

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert!(result.resource("A").unwrap().dependencies.is_empty());
    assert!(result.resource("B").unwrap().dependencies.is_empty());
    assert!(result.known_names.contains("B"));
}

#[test]
fn bindings_never_depend_on_themselves() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path().join("infra.go"),
        "package infra\n\nvar A = &Kind{}\nvar Loop = &Kind{Ref: Loop, Base: A}\n",
    );

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert_eq!(
        result.resource("Loop").unwrap().dependencies,
        vec!["A".to_string()]
    );
}

#[test]
fn unclassified_bindings_still_count_as_dependencies() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path().join("infra.go"),
        "package infra\n\nvar region = \"eu-west-1\"\nvar Bucket = &Kind{Region: region, Name: region}\n",
    );

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert_eq!(result.resources.len(), 1);
    assert_eq!(
        result.resource("Bucket").unwrap().dependencies,
        vec!["region".to_string()]
    );
}

#[test]
fn resource_count_matches_classified_bindings() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path().join("mixed.go"),
        r#"
package infra

var (
	One   = &Kind{}
	two   = 2
	Three = Kind{}
	four  = "four"
	Five  = []Kind{}
)

var six, Seven = 6, Kind(One)
"#,
    );

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert_eq!(result.known_names.len(), 7);
    assert_eq!(result.resources.len(), 4);
    for resource in &result.resources {
        for dependency in &resource.dependencies {
            assert!(result.known_names.contains(dependency));
        }
    }
    assert_eq!(
        result.resource("Seven").unwrap().dependencies,
        vec!["One".to_string()]
    );
}

#[test]
fn missing_root_is_recorded_and_scan_continues() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path().join("schema.go"), SCHEMA_FILE);
    let missing = dir.path().join("does-not-exist");

    let result = discover(
        &[dir.path().to_path_buf(), missing.clone()],
        &WalkOptions::default(),
        &schema_classifier,
    );

    assert_eq!(result.resources.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        &result.errors[0],
        DiscoverError::RootNotFound { path } if *path == missing
    ));
}

#[test]
fn malformed_file_is_skipped_without_stopping_the_scan() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path().join("a_broken.go"), "package p\n\nvar = = {\n");
    write(dir.path().join("b_good.go"), "package p\n\nvar Good = &Kind{}\n");

    let result = discover(&[dir.path()], &WalkOptions::default(), &kind_classifier);

    assert_eq!(result.resources.len(), 1);
    assert_eq!(result.resources[0].name, "Good");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], DiscoverError::Parse { .. }));
}

#[test]
fn excluded_directories_contribute_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(root.join("main.go"), "package p\n\nvar Root = &Kind{}\n");
    write(root.join("vendor/v.go"), "package v\n\nvar Vendored = &Kind{}\n");
    write(root.join(".hidden/h.go"), "package h\n\nvar = = broken\n");
    write(root.join("testdata/t.go"), "package t\n\nvar Fixture = &Kind{}\n");
    write(root.join("gen/g.go"), "package g\n\nvar Generated = &Kind{}\n");

    let options = WalkOptions::default().with_excluded_dir("gen");
    let result = discover(&[root], &options, &kind_classifier);

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(names(&result.known_names), vec!["Root"]);
    assert_eq!(result.resources.len(), 1);
}

#[test]
fn no_match_classifier_only_tracks_names() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path().join("schema.go"), SCHEMA_FILE);

    let classifying = discover(&[dir.path()], &WalkOptions::default(), &schema_classifier);
    let tracking = discover(&[dir.path()], &WalkOptions::default(), &NoMatch);

    assert!(tracking.resources.is_empty());
    assert!(tracking.errors.is_empty());
    assert_eq!(tracking.known_names, classifying.known_names);
}

#[test]
fn repeated_scans_are_identical() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path().join("schema.go"), SCHEMA_FILE);
    write(dir.path().join("pkg/infra.go"), "package infra\n\nvar A = &Kind{}\nvar B = &Kind{Ref: A}\n");

    let classifier = |descriptor: &TypeDescriptor, imports: &ImportTable| {
        schema_classifier(descriptor, imports).or_else(|| kind_classifier(descriptor, imports))
    };
    let first = discover(&[dir.path()], &WalkOptions::default(), &classifier);
    let second = discover(&[dir.path()], &WalkOptions::default(), &classifier);

    assert_eq!(first.resources, second.resources);
    assert_eq!(first.known_names, second.known_names);
    assert_eq!(first.resources.len(), 4);
}

#[test]
fn parallel_and_sequential_scans_agree() {
    let dir = tempfile::TempDir::new().unwrap();
    for i in 0..12 {
        write(
            dir.path().join(format!("pkg{i:02}/res.go")),
            &format!("package p\n\nvar Base{i} = &Kind{{}}\nvar Derived{i} = &Kind{{Ref: Base{i}}}\n"),
        );
    }

    let parallel = ResourceDiscoverer::new(WalkOptions::default())
        .discover(&[dir.path()], &kind_classifier);
    let sequential = ResourceDiscoverer::new(WalkOptions::default())
        .with_parallel(false)
        .discover(&[dir.path()], &kind_classifier);

    assert_eq!(parallel.resources.len(), 24);
    assert_eq!(parallel.resources, sequential.resources);
    assert_eq!(parallel.resources[0].name, "Base0");
}

#[test]
fn single_file_roots_are_processed_directly() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("infra.go");
    write(&file, "package infra\n\nvar A = &Kind{}\n");

    let result = discover(&[&file], &WalkOptions::default(), &kind_classifier);

    assert_eq!(result.resources.len(), 1);
    assert_eq!(result.resources[0].file, file);
}

#[test]
fn single_file_roots_without_source_extension_are_ignored() {
    let dir = tempfile::TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    write(&notes, "package infra\n\nvar A = &Kind{}\n");

    for options in [WalkOptions::default(), WalkOptions::permissive()] {
        let result = discover(&[&notes], &options, &kind_classifier);
        assert!(result.is_empty(), "{:?}", result.resources);
        assert!(result.known_names.is_empty());
        assert!(result.errors.is_empty());
    }
}

#[cfg(unix)]
#[test]
fn walk_error_keeps_earlier_files_and_later_roots() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::TempDir::new().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write(first.join("a.go"), "package p\n\nvar A = &Kind{}\n");
    write(first.join("b_locked/hidden.go"), "package p\n\nvar Hidden = &Kind{}\n");
    write(second.join("c.go"), "package p\n\nvar C = &Kind{}\n");

    let locked = first.join("b_locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let readable_anyway = fs::read_dir(&locked).is_ok();

    let result = discover(&[&first, &second], &WalkOptions::default(), &kind_classifier);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Privileged users can list the directory, so no walk error occurs.
    if readable_anyway {
        return;
    }

    let found: Vec<&str> = result.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(found, vec!["A", "C"]);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        &result.errors[0],
        DiscoverError::Walk { root, .. } if *root == first
    ));
}

#[test]
fn direct_file_entry_point_propagates_parse_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("broken.go");
    write(&file, "package p\n\nvar = = {\n");

    let err = ResourceDiscoverer::default()
        .discover_file(&file, &kind_classifier)
        .unwrap_err();
    assert!(matches!(err, DiscoverError::Parse { .. }));
}

#[test]
fn no_roots_yield_an_empty_result() {
    let roots: [&Path; 0] = [];
    let result = discover(&roots, &WalkOptions::default(), &kind_classifier);
    assert!(result.is_empty());
}
