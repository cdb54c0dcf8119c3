#![allow(non_snake_case)]

use super::*;
use crate::model::FieldSpec;
use crate::parser::parse_service;

fn types() -> TypeTable {
    TypeTable::standard()
}

fn geometry_source() -> MemorySource {
    let types = types();
    MemorySource::new()
        .with_text(&types, "geometry_msgs", "Point", "float64 x\nfloat64 y\nfloat64 z\n")
        .unwrap()
        .with_text(
            &types,
            "geometry_msgs",
            "Quaternion",
            "float64 x\nfloat64 y\nfloat64 z\nfloat64 w\n",
        )
        .unwrap()
        .with_text(
            &types,
            "geometry_msgs",
            "Pose",
            "Point position\nQuaternion orientation\n",
        )
        .unwrap()
        .with_text(
            &types,
            "std_msgs",
            "Header",
            "uint32 seq\ntime stamp\nstring frame_id\n",
        )
        .unwrap()
}

#[test]
fn TypeResolver___primitives_only___empty_closure() {
    let types = types();
    let source = MemorySource::new();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("A", vec![FieldSpec::scalar("int32", "a")]);

    let closure = resolver.resolve(&root, "my_pkg").unwrap();

    assert!(closure.is_empty());
}

#[test]
fn TypeResolver___qualified_reference___resolves_transitively() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("GetPose", vec![FieldSpec::scalar("geometry_msgs/Pose", "pose")]);

    let closure = resolver.resolve(&root, "my_pkg").unwrap();

    assert_eq!(
        closure.names(),
        vec![
            "geometry_msgs/Pose",
            "geometry_msgs/Point",
            "geometry_msgs/Quaternion"
        ]
    );
    assert_eq!(closure.get("geometry_msgs/Point").unwrap().package, "geometry_msgs");
}

#[test]
fn TypeResolver___bare_reference___resolves_in_current_package() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("Local", vec![FieldSpec::array("Point", "points")]);

    let closure = resolver.resolve(&root, "geometry_msgs").unwrap();

    assert_eq!(closure.names(), vec!["geometry_msgs/Point"]);
}

#[test]
fn TypeResolver___header___resolves_to_std_msgs() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("Stamped", vec![FieldSpec::scalar("Header", "header")]);

    let closure = resolver.resolve(&root, "my_pkg").unwrap();

    assert_eq!(closure.names(), vec!["std_msgs/Header"]);
}

#[test]
fn TypeResolver___same_type_twice___closure_has_one_entry() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new(
        "Segment",
        vec![
            FieldSpec::scalar("geometry_msgs/Point", "start"),
            FieldSpec::scalar("geometry_msgs/Point", "end"),
            FieldSpec::array("geometry_msgs/Point", "via"),
        ],
    );

    let closure = resolver.resolve(&root, "my_pkg").unwrap();

    assert_eq!(closure.len(), 1);
}

#[test]
fn TypeResolver___diamond___each_type_once() {
    let types = types();
    let source = geometry_source()
        .with_text(
            &types,
            "my_pkg",
            "Both",
            "geometry_msgs/Pose a\ngeometry_msgs/Point b\n",
        )
        .unwrap();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new(
        "Root",
        vec![FieldSpec::scalar("Both", "both"), FieldSpec::scalar("geometry_msgs/Pose", "p")],
    );

    let closure = resolver.resolve(&root, "my_pkg").unwrap();

    assert_eq!(
        closure.names(),
        vec![
            "my_pkg/Both",
            "geometry_msgs/Pose",
            "geometry_msgs/Point",
            "geometry_msgs/Quaternion"
        ]
    );
}

#[test]
fn TypeResolver___cycle___terminates() {
    let types = types();
    let source = MemorySource::new()
        .with_text(&types, "cyc", "A", "B[] children\nint32 value\n")
        .unwrap()
        .with_text(&types, "cyc", "B", "A[] parents\n")
        .unwrap();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("Root", vec![FieldSpec::scalar("A", "a")]);

    let closure = resolver.resolve(&root, "cyc").unwrap();

    assert_eq!(closure.names(), vec!["cyc/A", "cyc/B"]);
}

#[test]
fn TypeResolver___unknown_type___returns_unresolved_type() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("Root", vec![FieldSpec::scalar("nav_msgs/Path", "path")]);

    let err = resolver.resolve(&root, "my_pkg").unwrap_err();

    match err {
        GenError::UnresolvedType {
            type_name,
            referenced_from,
        } => {
            assert_eq!(type_name, "nav_msgs/Path");
            assert_eq!(referenced_from, "my_pkg/Root");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn TypeResolver___nested_unknown___names_referencing_type() {
    let types = types();
    let source = MemorySource::new()
        .with_text(&types, "a_pkg", "Outer", "Missing inner\n")
        .unwrap();
    let resolver = TypeResolver::new(&types, &source);
    let root = StructSpec::new("Root", vec![FieldSpec::scalar("a_pkg/Outer", "o")]);

    let err = resolver.resolve(&root, "my_pkg").unwrap_err();

    assert_eq!(
        err.to_string(),
        "unresolved type 'a_pkg/Missing' referenced from a_pkg/Outer"
    );
}

#[test]
fn TypeResolver___resolve_service___shares_closure() {
    let types = types();
    let source = geometry_source();
    let resolver = TypeResolver::new(&types, &source);
    let spec = parse_service(
        &types,
        "my_pkg",
        "Move",
        "geometry_msgs/Pose target\n---\ngeometry_msgs/Point reached\nbool ok\n",
    )
    .unwrap();

    let closure = resolver.resolve_service(&spec).unwrap();

    assert_eq!(closure.len(), 3);
}

#[test]
fn DependencyClosure___insert___rejects_duplicates() {
    let mut closure = DependencyClosure::new();
    let entry = ResolvedType {
        full_name: "p/T".into(),
        package: "p".into(),
        spec: StructSpec::new("T", vec![]),
    };

    assert!(closure.insert(entry.clone()));
    assert!(!closure.insert(entry));
    assert_eq!(closure.len(), 1);
}

#[test]
fn PackagePathSource___loads_msg_file_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let msg_dir = dir.path().join("stacks").join("geometry_msgs").join("msg");
    std::fs::create_dir_all(&msg_dir).unwrap();
    std::fs::write(msg_dir.join("Point.msg"), "float64 x\nfloat64 y\nfloat64 z\n").unwrap();

    let source = PackagePathSource::new(&[dir.path().to_path_buf()]);
    let spec = source
        .load(&types(), "geometry_msgs", "Point")
        .unwrap()
        .unwrap();

    assert_eq!(spec.fields.len(), 3);
    assert!(source.package_dir("geometry_msgs").is_some());
}

#[test]
fn PackagePathSource___missing_type___returns_none() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("pkg").join("msg")).unwrap();

    let source = PackagePathSource::new(&[dir.path().to_path_buf()]);

    assert!(source.load(&types(), "pkg", "Nope").unwrap().is_none());
    assert!(source.load(&types(), "other", "Nope").unwrap().is_none());
}

#[test]
fn PackagePathSource___with_package___overrides_search() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("elsewhere");
    std::fs::create_dir_all(pkg.join("msg")).unwrap();
    std::fs::write(pkg.join("msg").join("Thing.msg"), "int8 v\n").unwrap();

    let source = PackagePathSource::new(&[]).with_package("my_pkg", &pkg);

    assert!(source.load(&types(), "my_pkg", "Thing").unwrap().is_some());
}
